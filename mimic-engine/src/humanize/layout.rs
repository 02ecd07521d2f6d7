//! Lowercase QWERTY adjacency used to pick plausible typos.

use super::rng::RandomSource;

/// Keys physically next to `key` on a QWERTY board (lowercase letters only).
pub fn neighbors(key: char) -> Option<&'static [char]> {
    let keys: &'static [char] = match key {
        'a' => &['s', 'q', 'w', 'z', 'x'],
        'b' => &['v', 'g', 'h', 'n'],
        'c' => &['x', 'd', 'f', 'v'],
        'd' => &['s', 'e', 'r', 'f', 'c', 'x'],
        'e' => &['w', 'r', 'd', 's'],
        'f' => &['d', 'r', 't', 'g', 'v', 'c'],
        'g' => &['f', 't', 'y', 'h', 'b', 'v'],
        'h' => &['g', 'y', 'u', 'j', 'n', 'b'],
        'i' => &['u', 'o', 'k', 'j'],
        'j' => &['h', 'u', 'i', 'k', 'm', 'n'],
        'k' => &['j', 'i', 'o', 'l', ',', 'm'],
        'l' => &['k', 'o', 'p', ';', '.', ','],
        'm' => &['n', 'j', 'k', ','],
        'n' => &['b', 'h', 'j', 'm'],
        'o' => &['i', 'p', 'l', 'k'],
        'p' => &['o', '[', ']', 'l', ';'],
        'q' => &['w', 'a'],
        'r' => &['e', 't', 'f', 'd'],
        's' => &['a', 'w', 'e', 'd', 'x', 'z'],
        't' => &['r', 'y', 'g', 'f'],
        'u' => &['y', 'i', 'j', 'h'],
        'v' => &['c', 'f', 'g', 'b'],
        'w' => &['q', 'e', 's', 'a'],
        'x' => &['z', 's', 'd', 'c'],
        'y' => &['t', 'u', 'h', 'g'],
        'z' => &['a', 's', 'x'],
        _ => return None,
    };
    Some(keys)
}

/// A wrong key a person aiming for `intended` could plausibly hit.
///
/// Letters pick a random neighbour and keep their case. Characters outside
/// the table map deterministically: space to `x`, a digit to its predecessor
/// (`0` wraps to `9`), anything else to itself.
pub fn typo_for(intended: char, rng: &RandomSource) -> char {
    let lower = intended.to_ascii_lowercase();
    if let Some(&slip) = neighbors(lower).and_then(|keys| rng.choose(keys)) {
        return if intended.is_ascii_uppercase() {
            slip.to_ascii_uppercase()
        } else {
            slip
        };
    }

    match intended {
        ' ' => 'x',
        '0'..='9' => intended
            .to_digit(10)
            .and_then(|d| char::from_digit((d + 9) % 10, 10))
            .unwrap_or(intended),
        other => other,
    }
}
