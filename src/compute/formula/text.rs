//! Name-level text measurements used by the structural, frequency and
//! numerological families.

/// Relative English letter frequencies (percent), a..z.
const ENGLISH_FREQUENCY: [f64; 26] = [
    8.17, 1.49, 2.78, 4.25, 12.70, 2.23, 2.02, 6.09, 6.97, 0.15, 0.77, 4.03, 2.41, 6.75, 7.51,
    1.93, 0.10, 5.99, 6.33, 9.06, 2.76, 0.98, 2.36, 0.15, 1.97, 0.07,
];
const MAX_ENGLISH_FREQUENCY: f64 = 12.70;

/// Lowercase ASCII letters of a name, in order.
pub fn letters(name: &str) -> Vec<u8> {
    name.bytes()
        .filter(u8::is_ascii_alphabetic)
        .map(|b| b.to_ascii_lowercase())
        .collect()
}

#[inline]
pub fn is_vowel(letter: u8) -> bool {
    matches!(letter, b'a' | b'e' | b'i' | b'o' | b'u' | b'y')
}

/// Syllable estimate: number of vowel groups, at least one for non-empty input.
pub fn estimate_syllables(letters: &[u8]) -> usize {
    let mut groups = 0;
    let mut in_group = false;
    for &l in letters {
        let v = is_vowel(l);
        if v && !in_group {
            groups += 1;
        }
        in_group = v;
    }
    if letters.is_empty() { 0 } else { groups.max(1) }
}

/// Letter counts indexed a..z.
pub fn letter_counts(letters: &[u8]) -> [usize; 26] {
    let mut counts = [0usize; 26];
    for &l in letters {
        counts[(l - b'a') as usize] += 1;
    }
    counts
}

/// Shannon entropy in bits, normalized by log2(26) into [0, 1].
pub fn normalized_entropy(letters: &[u8]) -> f64 {
    if letters.is_empty() {
        return 0.0;
    }
    let n = letters.len() as f64;
    let entropy: f64 = letter_counts(letters)
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            -p * p.log2()
        })
        .sum();
    entropy / 26f64.log2()
}

/// Fraction of letters that repeat an earlier letter: 1 - unique/len.
pub fn repetition(letters: &[u8]) -> f64 {
    if letters.is_empty() {
        return 0.0;
    }
    let unique = letter_counts(letters).iter().filter(|&&c| c > 0).count();
    1.0 - unique as f64 / letters.len() as f64
}

/// Mean rarity against English frequency: 0 for common letters, ~1 for rare.
pub fn rarity(letters: &[u8]) -> f64 {
    if letters.is_empty() {
        return 0.0;
    }
    letters
        .iter()
        .map(|&l| 1.0 - ENGLISH_FREQUENCY[(l - b'a') as usize] / MAX_ENGLISH_FREQUENCY)
        .sum::<f64>()
        / letters.len() as f64
}

/// Mean alphabet position in [0, 1] (a = 0, z = 1).
pub fn spectral_centroid(letters: &[u8]) -> f64 {
    if letters.is_empty() {
        return 0.5;
    }
    letters.iter().map(|&l| (l - b'a') as f64).sum::<f64>() / (letters.len() as f64 * 25.0)
}

pub fn is_palindrome(letters: &[u8]) -> bool {
    letters.len() > 1 && letters.iter().eq(letters.iter().rev())
}

/// Balance of alphabet weight between the two halves, in [0, 1].
pub fn balance(letters: &[u8]) -> f64 {
    if letters.len() < 2 {
        return 1.0;
    }
    let half = letters.len() / 2;
    let weight = |s: &[u8]| s.iter().map(|&l| (l - b'a' + 1) as f64).sum::<f64>();
    let left = weight(&letters[..half]);
    let right = weight(&letters[letters.len() - half..]);
    let total = left + right;
    if total <= 0.0 {
        1.0
    } else {
        1.0 - (left - right).abs() / total
    }
}

/// Fraction of adjacent letter pairs that alternate vowel/consonant.
pub fn rhythm(letters: &[u8]) -> f64 {
    if letters.len() < 2 {
        return 0.0;
    }
    let alternating = letters
        .windows(2)
        .filter(|w| is_vowel(w[0]) != is_vowel(w[1]))
        .count();
    alternating as f64 / (letters.len() - 1) as f64
}

/// Pythagorean letter value: a=1 .. i=9, j=1 .. r=9, s=1 .. z=8.
#[inline]
pub fn pythagorean_value(letter: u8) -> u64 {
    ((letter - b'a') % 9 + 1) as u64
}

/// Digit root in 1..=9; 0 only for a zero total.
pub fn digit_root(total: u64) -> u32 {
    if total == 0 { 0 } else { (1 + (total - 1) % 9) as u32 }
}

pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Fibonacci number nearest to `value`.
///
/// Values past the largest `u64` Fibonacci number map to that number.
pub fn nearest_fibonacci(value: f64) -> u64 {
    let (mut a, mut b) = (1u64, 2u64);
    while (b as f64) < value {
        let Some(next) = a.checked_add(b) else {
            return b;
        };
        a = b;
        b = next;
    }
    if (value - a as f64).abs() <= (b as f64 - value).abs() {
        a
    } else {
        b
    }
}
