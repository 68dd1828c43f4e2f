/// Moves `index` one step through a list of `len` items, wrapping at both
/// ends. An empty list always yields 0.
pub const fn step_index(index: usize, len: usize, forward: bool) -> usize {
    match (len, forward) {
        (0, _) => 0,
        (_, true) => (index + 1) % len,
        (_, false) if index == 0 || index > len => len - 1,
        (_, false) => index - 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_in_both_directions() {
        assert_eq!(step_index(2, 3, true), 0);
        assert_eq!(step_index(0, 3, false), 2);
        assert_eq!(step_index(1, 3, false), 0);
    }

    #[test]
    fn empty_list_stays_at_zero() {
        assert_eq!(step_index(4, 0, true), 0);
        assert_eq!(step_index(4, 0, false), 0);
    }

    #[test]
    fn out_of_range_cursor_lands_on_last_item() {
        assert_eq!(step_index(9, 3, false), 2);
    }
}
