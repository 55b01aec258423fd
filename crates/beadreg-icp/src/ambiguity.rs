use beadreg_3d::point::PointMatch;

/// Remove ambiguous and repeated matches in place.
///
/// A match is ambiguous if its source is also matched to a different
/// destination, or its destination is also matched to a different source. In
/// that case every match touching either of its endpoints is removed. A match
/// that only repeats an identical `(source, destination)` pair keeps its first
/// occurrence.
///
/// After the call, no source and no destination appears more than once in
/// `matches`. Points are compared by handle, never by coordinates.
///
/// Returns the removed matches in their original order.
pub fn remove_ambiguous_matches(matches: &mut Vec<PointMatch>) -> Vec<PointMatch> {
    let mut to_remove = Vec::new();

    for (i, m) in matches.iter().enumerate() {
        let (src, dst) = (m.source(), m.destination());

        let different_occurrence = matches
            .iter()
            .any(|other| (other.source() == src) != (other.destination() == dst));

        if different_occurrence {
            to_remove.extend(
                matches
                    .iter()
                    .enumerate()
                    .filter(|(_, other)| other.source() == src || other.destination() == dst)
                    .map(|(j, _)| j),
            );
        } else if matches.iter().position(|other| other.same_pair(m)) != Some(i) {
            to_remove.push(i);
        }
    }

    to_remove.sort_unstable();
    to_remove.dedup();

    // remove from the highest index down so that lower indices stay valid
    let mut removed = to_remove
        .iter()
        .rev()
        .map(|&j| matches.remove(j))
        .collect::<Vec<_>>();
    removed.reverse();

    removed
}
