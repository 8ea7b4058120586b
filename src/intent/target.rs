//! Target-filter resolution against board state.
//!
//! Pure lookup: a filter plus a board snapshot yields the matching object
//! ids, in document order. Matching zero objects is not an error — the
//! executor emits zero requests and says so in the summary.

use crate::intent::TargetFilter;
use crate::types::board::{BoardObject, BoardState};
use crate::types::colors::colors_match;

/// Resolve a filter to matching object ids.
pub fn resolve_targets(filter: &TargetFilter, board: &BoardState) -> Vec<String> {
    if filter.use_selection {
        return board
            .selected_objects()
            .iter()
            .map(|o| o.id.clone())
            .collect();
    }

    board
        .objects
        .iter()
        .filter(|obj| matches_type(filter, obj) && matches_color(filter, obj))
        .map(|o| o.id.clone())
        .collect()
}

fn matches_type(filter: &TargetFilter, obj: &BoardObject) -> bool {
    if let Some(shape) = filter.shape_type.as_deref() {
        return obj.object_type.eq_ignore_ascii_case(shape);
    }
    match filter.object_type.as_deref() {
        None => true,
        Some("shape") => obj.is_shape(),
        // A bare shape name ("circle") may arrive as the object type.
        Some(t) => obj.object_type.eq_ignore_ascii_case(t),
    }
}

fn matches_color(filter: &TargetFilter, obj: &BoardObject) -> bool {
    match filter.color.as_deref() {
        None => true,
        Some(wanted) => obj
            .display_color()
            .map(|have| colors_match(wanted, have))
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> BoardState {
        let mut board = BoardState::empty();
        for (id, kind, color) in [
            ("c1", "circle", Some("#EF4444")),
            ("c2", "circle", Some("#3B82F6")),
            ("c3", "circle", None),
            ("st1", "star", Some("#EF4444")),
            ("n1", "sticky", Some("#EAB308")),
        ] {
            let mut obj = BoardObject::new(id, kind, 0.0, 0.0);
            obj.fill = color.map(String::from);
            board.objects.push(obj);
        }
        board
    }

    #[test]
    fn test_shape_type_filter_matches_all_circles() {
        let filter = TargetFilter {
            object_type: Some("shape".into()),
            shape_type: Some("circle".into()),
            ..Default::default()
        };
        assert_eq!(resolve_targets(&filter, &board()), vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_generic_shape_filter_excludes_stickies() {
        let filter = TargetFilter {
            object_type: Some("shape".into()),
            ..Default::default()
        };
        assert_eq!(resolve_targets(&filter, &board()), vec!["c1", "c2", "c3", "st1"]);
    }

    #[test]
    fn test_color_filter_uses_name_equivalence() {
        let filter = TargetFilter {
            color: Some("red".into()),
            ..Default::default()
        };
        assert_eq!(resolve_targets(&filter, &board()), vec!["c1", "st1"]);
    }

    #[test]
    fn test_selection_filter_ignores_type() {
        let mut board = board();
        board.selected_ids = vec!["n1".into(), "c2".into()];
        let filter = TargetFilter {
            object_type: Some("circle".into()),
            use_selection: true,
            ..Default::default()
        };
        assert_eq!(resolve_targets(&filter, &board), vec!["n1", "c2"]);
    }

    #[test]
    fn test_zero_matches_is_empty_not_error() {
        let filter = TargetFilter {
            object_type: Some("frame".into()),
            ..Default::default()
        };
        assert!(resolve_targets(&filter, &board()).is_empty());
    }
}
