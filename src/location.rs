//! Coordinate arithmetic on the padded board array.
//!
//! A cell `(x, y)` of a board of width `x_size` lives at index
//! `(x + 1) + (y + 1) * (x_size + 1)`. Row 0 and column 0 of the padded
//! grid are walls, and every row shares its right wall with the left wall of
//! the next one, so index arithmetic never leaves the array.

use crate::constants::{Loc, NULL_LOC, PASS_LOC};
use crate::error::BoardError;

/// Column letters, skipping `I`.
const X_CHARS: &[u8; 25] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

#[inline]
pub fn get_loc(x: usize, y: usize, x_size: usize) -> Loc {
    (x + 1) + (y + 1) * (x_size + 1)
}

/// Column of `loc`; `-1` on the left wall.
#[inline]
pub fn get_x(loc: Loc, x_size: usize) -> i32 {
    (loc % (x_size + 1)) as i32 - 1
}

/// Row of `loc`; `-1` on the top wall (including the null and pass slots).
#[inline]
pub fn get_y(loc: Loc, x_size: usize) -> i32 {
    (loc / (x_size + 1)) as i32 - 1
}

/// Whether `loc` maps into the `x_size` by `y_size` rectangle.
pub fn is_in_rect(loc: Loc, x_size: usize, y_size: usize) -> bool {
    let x = get_x(loc, x_size);
    let y = get_y(loc, x_size);
    x >= 0 && y >= 0 && (x as usize) < x_size && (y as usize) < y_size
}

/// Offsets in the order up, left, right, down, then the four diagonals.
pub fn adjacent_offsets(x_size: usize) -> [isize; 8] {
    let w = x_size as isize + 1;
    [-w, -1, 1, w, -w - 1, -w + 1, w - 1, w + 1]
}

pub fn is_adjacent(loc0: Loc, loc1: Loc, x_size: usize) -> bool {
    let w = x_size + 1;
    loc0 + w == loc1 || loc0 + 1 == loc1 || loc0 == loc1 + 1 || loc0 == loc1 + w
}

/// Point reflection through the board center.
pub fn get_mirror_loc(loc: Loc, x_size: usize, y_size: usize) -> Loc {
    if loc == NULL_LOC || loc == PASS_LOC {
        return loc;
    }
    let x = get_x(loc, x_size) as usize;
    let y = get_y(loc, x_size) as usize;
    get_loc(x_size - 1 - x, y_size - 1 - y, x_size)
}

/// The single center point, or `NULL_LOC` when either side is even.
pub fn get_center_loc(x_size: usize, y_size: usize) -> Loc {
    if x_size % 2 == 0 || y_size % 2 == 0 {
        return NULL_LOC;
    }
    get_loc(x_size / 2, y_size / 2, x_size)
}

/// Whether `loc` is one of the (up to four) central points.
pub fn is_central(loc: Loc, x_size: usize, y_size: usize) -> bool {
    let x = get_x(loc, x_size);
    let y = get_y(loc, x_size);
    let (xs, ys) = (x_size as i32, y_size as i32);
    x >= (xs - 1) / 2 && x <= xs / 2 && y >= (ys - 1) / 2 && y <= ys / 2
}

/// Manhattan distance.
pub fn distance(loc0: Loc, loc1: Loc, x_size: usize) -> i32 {
    let dx = get_x(loc0, x_size) - get_x(loc1, x_size);
    let dy = get_y(loc0, x_size) - get_y(loc1, x_size);
    dx.abs() + dy.abs()
}

pub fn euclidean_distance_squared(loc0: Loc, loc1: Loc, x_size: usize) -> i32 {
    let dx = get_x(loc0, x_size) - get_x(loc1, x_size);
    let dy = get_y(loc0, x_size) - get_y(loc1, x_size);
    dx * dx + dy * dy
}

/// Machine form: `(x,y)`, `pass` or `null`.
pub fn to_string_mach(loc: Loc, x_size: usize) -> String {
    match loc {
        PASS_LOC => "pass".to_string(),
        NULL_LOC => "null".to_string(),
        _ => format!("({},{})", get_x(loc, x_size), get_y(loc, x_size)),
    }
}

/// Human form such as `D4`, `pass` or `null`, falling back to the machine
/// form for anything outside the board.
pub fn to_string(loc: Loc, x_size: usize, y_size: usize) -> String {
    if x_size > 25 * 25 {
        return to_string_mach(loc, x_size);
    }
    match loc {
        PASS_LOC => return "pass".to_string(),
        NULL_LOC => return "null".to_string(),
        _ => {}
    }
    if !is_in_rect(loc, x_size, y_size) {
        return to_string_mach(loc, x_size);
    }
    let x = get_x(loc, x_size) as usize;
    let y = get_y(loc, x_size) as usize;
    let row = y_size - y;
    if x <= 24 {
        format!("{}{}", X_CHARS[x] as char, row)
    } else {
        format!(
            "{}{}{}",
            X_CHARS[x / 25 - 1] as char,
            X_CHARS[x % 25] as char,
            row
        )
    }
}

fn letter_coordinate(c: char) -> Option<usize> {
    let c = c.to_ascii_uppercase();
    match c {
        'A'..='H' => Some(c as usize - 'A' as usize),
        'J'..='Z' => Some(c as usize - 'A' as usize - 1),
        _ => None,
    }
}

/// Parse either form produced by [`to_string`] or [`to_string_mach`].
///
/// `null` is not accepted. Coordinates outside the board are rejected.
pub fn try_of_string(s: &str, x_size: usize, y_size: usize) -> Option<Loc> {
    let s = s.trim();
    if s.len() < 2 {
        return None;
    }
    if s.eq_ignore_ascii_case("pass") || s.eq_ignore_ascii_case("pss") {
        return Some(PASS_LOC);
    }

    let (x, y) = if let Some(inner) = s.strip_prefix('(') {
        let inner = inner.strip_suffix(')')?;
        let (xs, ys) = inner.split_once(',')?;
        let x: i64 = xs.trim().parse().ok()?;
        let y: i64 = ys.trim().parse().ok()?;
        (x, y)
    } else {
        let mut chars = s.chars();
        let mut x = letter_coordinate(chars.next()?)? as i64;
        let rest = chars.as_str();
        let rest = match rest.chars().next() {
            Some(c) if c.is_ascii_alphabetic() => {
                let x1 = letter_coordinate(c)? as i64;
                x = (x + 1) * 25 + x1;
                &rest[1..]
            }
            _ => rest,
        };
        let row: i64 = rest.parse().ok()?;
        (x, y_size as i64 - row)
    };

    if x < 0 || y < 0 || x >= x_size as i64 || y >= y_size as i64 {
        return None;
    }
    Some(get_loc(x as usize, y as usize, x_size))
}

pub fn of_string(s: &str, x_size: usize, y_size: usize) -> Result<Loc, BoardError> {
    try_of_string(s, x_size, y_size).ok_or_else(|| BoardError::ParseLocation(s.to_string()))
}

/// Parse a whitespace-separated list of locations.
pub fn parse_sequence(s: &str, x_size: usize, y_size: usize) -> Result<Vec<Loc>, BoardError> {
    s.split_whitespace()
        .map(|piece| of_string(piece, x_size, y_size))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_loc_round_trip() {
        for x_size in [1, 7, 9, 19] {
            for y in 0..x_size {
                for x in 0..x_size {
                    let loc = get_loc(x, y, x_size);
                    assert_eq!(get_x(loc, x_size), x as i32);
                    assert_eq!(get_y(loc, x_size), y as i32);
                }
            }
        }
    }

    #[test]
    fn test_pass_and_null_are_off_board() {
        assert!(!is_in_rect(PASS_LOC, 9, 9));
        assert!(!is_in_rect(NULL_LOC, 9, 9));
        assert_eq!(get_y(PASS_LOC, 9), -1);
    }

    #[test]
    fn test_to_string() {
        assert_eq!(to_string(get_loc(0, 0, 9), 9, 9), "A9");
        assert_eq!(to_string(get_loc(8, 8, 9), 9, 9), "J1");
        assert_eq!(to_string(get_loc(4, 4, 9), 9, 9), "E5");
        assert_eq!(to_string(PASS_LOC, 9, 9), "pass");
        assert_eq!(to_string(NULL_LOC, 9, 9), "null");
        assert_eq!(to_string_mach(get_loc(3, 5, 9), 9), "(3,5)");
    }

    #[test]
    fn test_of_string() {
        assert_eq!(try_of_string("e5", 9, 9), Some(get_loc(4, 4, 9)));
        assert_eq!(try_of_string("J1", 9, 9), Some(get_loc(8, 8, 9)));
        assert_eq!(try_of_string("PSS", 9, 9), Some(PASS_LOC));
        assert_eq!(try_of_string("(3,5)", 9, 9), Some(get_loc(3, 5, 9)));
        assert_eq!(try_of_string("I5", 9, 9), None);
        assert_eq!(try_of_string("K5", 9, 9), None);
        assert_eq!(try_of_string("A10", 9, 9), None);
        assert_eq!(try_of_string("(9,0)", 9, 9), None);
        assert_eq!(try_of_string("null", 9, 9), None);
        assert!(of_string("Z", 9, 9).is_err());
    }

    #[test]
    fn test_parse_sequence() {
        let locs = parse_sequence("A1 pass  B2", 9, 9).unwrap();
        assert_eq!(locs, vec![get_loc(0, 8, 9), PASS_LOC, get_loc(1, 7, 9)]);
        assert!(parse_sequence("A1 Q9", 9, 9).is_err());
    }

    #[test]
    fn test_mirror_and_center() {
        assert_eq!(get_mirror_loc(get_loc(0, 0, 9), 9, 9), get_loc(8, 8, 9));
        assert_eq!(get_center_loc(9, 9), get_loc(4, 4, 9));
        assert_eq!(get_center_loc(8, 9), NULL_LOC);
        assert!(is_central(get_loc(3, 3, 8), 8, 8));
        assert!(is_central(get_loc(4, 4, 8), 8, 8));
        assert!(!is_central(get_loc(2, 4, 8), 8, 8));
    }

    #[test]
    fn test_distances() {
        let a = get_loc(1, 1, 9);
        let b = get_loc(4, 5, 9);
        assert_eq!(distance(a, b, 9), 7);
        assert_eq!(euclidean_distance_squared(a, b, 9), 25);
        assert!(is_adjacent(a, get_loc(1, 2, 9), 9));
        assert!(!is_adjacent(a, get_loc(2, 2, 9), 9));
    }
}
