//! Roman numeral conversion for Bulletin A volume numbers.

/// Numeral tokens, largest value first.
const NUMERALS: [(&str, u32); 13] = [
    ("M", 1000),
    ("CM", 900),
    ("D", 500),
    ("CD", 400),
    ("C", 100),
    ("XC", 90),
    ("L", 50),
    ("XL", 40),
    ("X", 10),
    ("IX", 9),
    ("V", 5),
    ("IV", 4),
    ("I", 1),
];

/// Decode a Roman numeral, ignoring case.
///
/// Tokens are consumed greedily in table order. Decoding stops silently at
/// the first character that no remaining token matches, so `"xiiz"` decodes
/// to 12 and `"z"` to 0. Filenames are matched against the volume grammar
/// before they get here, which is the only validation applied.
///
/// # Examples
/// ```
/// use iers_harvester::roman::to_integer;
///
/// assert_eq!(to_integer("xxxviii"), 38);
/// assert_eq!(to_integer("MCMXCIX"), 1999);
/// ```
#[must_use]
pub fn to_integer(roman: &str) -> u32 {
    let upper = roman.to_ascii_uppercase();
    let mut rest = upper.as_str();
    let mut result = 0;

    for (numeral, value) in NUMERALS {
        while let Some(tail) = rest.strip_prefix(numeral) {
            result += value;
            rest = tail;
        }
    }

    result
}

/// Encode an integer as an upper-case Roman numeral.
///
/// Zero encodes to the empty string. There is no upper bound: values above
/// 3999 simply repeat `M`.
///
/// # Examples
/// ```
/// use iers_harvester::roman::from_integer;
///
/// assert_eq!(from_integer(38), "XXXVIII");
/// assert_eq!(from_integer(0), "");
/// ```
#[must_use]
pub fn from_integer(mut n: u32) -> String {
    let mut result = String::new();

    for (numeral, value) in NUMERALS {
        while n >= value {
            result.push_str(numeral);
            n -= value;
        }
    }

    result
}
