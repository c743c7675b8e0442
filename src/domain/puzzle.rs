/// Puzzle records: the five gate puzzles and their answer checks.
///
/// Puzzles are static content. Each one carries a kind-specific payload
/// (a tagged variant per puzzle kind), a canonical solution, two hint
/// tiers and the key it grants. Cipher puzzles have no stored answer:
/// the canonical word is their own ciphertext run through its decoder. Nothing here is mutated at runtime; the
/// session only records *which* ids are solved.

use std::fmt;

use crate::error::GateError;

use super::cipher;

/// Puzzle identifier, always in `1..=PuzzleId::COUNT`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PuzzleId(u8);

impl PuzzleId {
    pub const COUNT: usize = 5;

    pub const fn new(n: u8) -> Option<PuzzleId> {
        if n >= 1 && n as usize <= Self::COUNT {
            Some(PuzzleId(n))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based index for per-puzzle arrays.
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }

    pub fn all() -> impl Iterator<Item = PuzzleId> {
        (1..=Self::COUNT as u8).map(PuzzleId)
    }
}

impl TryFrom<u8> for PuzzleId {
    type Error = GateError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        PuzzleId::new(n).ok_or(GateError::UnknownPuzzle(n))
    }
}

impl fmt::Display for PuzzleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One line of the debug listing. Buggy lines carry their fix.
#[derive(Debug)]
pub struct CodeLine {
    pub number: u8,
    pub text: &'static str,
    pub bug: Option<BugFix>,
}

#[derive(Debug)]
pub struct BugFix {
    pub id: u8,
    pub fix: &'static str,
    pub options: [&'static str; 3],
}

impl BugFix {
    pub fn is_correct(&self, choice: usize) -> bool {
        self.options.get(choice).is_some_and(|o| *o == self.fix)
    }
}

/// Kind-specific content shown by the overlay.
#[derive(Debug)]
pub enum PuzzleKind {
    /// Space-separated hex bytes to read as ASCII.
    Hex { bytes: &'static str },
    /// Pseudocode listing whose return value is the answer.
    Pseudocode { code: &'static str },
    /// A written decoding procedure: `input` shifted back by `shift`.
    Algorithm { algorithm: &'static str, input: &'static str, shift: u8 },
    /// Caesar-shifted word; the overlay lets the player try shifts.
    Caesar { encoded: &'static str, shift: u8 },
    /// Listing with buggy lines; each must be located and fixed.
    Debug { listing: &'static [CodeLine] },
}

impl PuzzleKind {
    pub fn label(&self) -> &'static str {
        match self {
            PuzzleKind::Hex { .. } => "hex",
            PuzzleKind::Pseudocode { .. } => "pseudocode",
            PuzzleKind::Algorithm { .. } => "algorithm",
            PuzzleKind::Caesar { .. } => "caesar",
            PuzzleKind::Debug { .. } => "debug",
        }
    }
}

#[derive(Debug)]
pub enum Solution {
    Word(&'static str),
    /// Whatever the puzzle's content decodes to.
    Decoded,
    Bugs(&'static [u8]),
}

/// What the player submitted.
#[derive(Clone, Copy, Debug)]
pub enum Answer<'a> {
    Text(&'a str),
    FixedBugs(&'a [u8]),
}

#[derive(Debug)]
pub struct Puzzle {
    pub id: PuzzleId,
    pub title: &'static str,
    pub description: &'static str,
    pub kind: PuzzleKind,
    pub solution: Solution,
    pub hints: [&'static str; 2],
    pub key: &'static str,
}

impl Puzzle {
    /// Does this answer solve the puzzle?
    /// Text is compared trimmed and case-insensitively; bug lists as sets.
    pub fn accepts(&self, answer: Answer<'_>) -> bool {
        match (&self.solution, answer) {
            (Solution::Word(expected), Answer::Text(given)) => {
                normalize(given) == normalize(expected)
            }
            (Solution::Decoded, Answer::Text(given)) => self
                .decoded()
                .is_some_and(|expected| normalize(given) == normalize(&expected)),
            (Solution::Bugs(expected), Answer::FixedBugs(fixed)) => {
                expected.iter().all(|id| fixed.contains(id))
                    && fixed.iter().all(|id| expected.contains(id))
            }
            _ => false,
        }
    }

    /// Plain text of a cipher puzzle's content. None for puzzles that
    /// carry no ciphertext, or when the content does not decode.
    pub fn decoded(&self) -> Option<String> {
        match self.kind {
            PuzzleKind::Hex { bytes } => cipher::hex_to_ascii(bytes),
            PuzzleKind::Algorithm { input, shift, .. } => Some(cipher::shift_back(input, shift)),
            PuzzleKind::Caesar { encoded, shift } => Some(cipher::caesar_decode(encoded, shift)),
            PuzzleKind::Pseudocode { .. } | PuzzleKind::Debug { .. } => None,
        }
    }

    /// The bug on a listing line, if this is the debug puzzle and the line is buggy.
    pub fn bug_on_line(&self, line: u8) -> Option<&'static BugFix> {
        match self.kind {
            PuzzleKind::Debug { listing } => listing
                .iter()
                .find(|l| l.number == line)
                .and_then(|l| l.bug.as_ref()),
            _ => None,
        }
    }

    /// Hint text for a tier (1 or 2).
    pub fn hint(&self, tier: u8) -> Option<&'static str> {
        match tier {
            1 | 2 => Some(self.hints[tier as usize - 1]),
            _ => None,
        }
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_uppercase()
}

/// The puzzle guarding a gate.
pub fn puzzle(id: PuzzleId) -> &'static Puzzle {
    &PUZZLES[id.index()]
}

// ══════════════════════════════════════════════════════════════
// Content
// ══════════════════════════════════════════════════════════════

static PUZZLES: [Puzzle; PuzzleId::COUNT] = [
    Puzzle {
        id: PuzzleId(1),
        title: "DECODE THE SECRET",
        description: "Convert this hexadecimal message to ASCII to find the password. \
                      Use the reference chart below.",
        kind: PuzzleKind::Hex { bytes: "47 41 54 45 57 41 59" },
        solution: Solution::Decoded,
        hints: [
            "Each pair of hex digits is one ASCII character. Convert to decimal, then find the letter.",
            "0x47 is 71, which is 'G'. 0x41 is 65, which is 'A'.",
        ],
        key: "Ruby Key",
    },
    Puzzle {
        id: PuzzleId(2),
        title: "ANALYZE THE CODE",
        description: "What value does this function return for mystery(10)?",
        kind: PuzzleKind::Pseudocode { code: MYSTERY_CODE },
        solution: Solution::Word("42"),
        hints: [
            "The loop adds every number from 1 to n.",
            "Sum of 1 to 10 is 55. Then subtract n and 3.",
        ],
        key: "Sapphire Key",
    },
    Puzzle {
        id: PuzzleId(3),
        title: "ALGORITHM CHALLENGE",
        description: "Follow the algorithm to decode the secret word.",
        kind: PuzzleKind::Algorithm { algorithm: DECODE_ALGORITHM, input: "XQORFN", shift: 3 },
        solution: Solution::Decoded,
        hints: [
            "Work one letter at a time and remember to wrap past A.",
            "X(24) - 3 = U(21), Q(17) - 3 = N(14)...",
        ],
        key: "Emerald Key",
    },
    Puzzle {
        id: PuzzleId(4),
        title: "CAESAR CIPHER DECODER",
        description: "Find the shift that decodes this message, then enter the decoded word.",
        kind: PuzzleKind::Caesar { encoded: "BDAOQQP", shift: 12 },
        solution: Solution::Decoded,
        hints: [
            "Try different shift values. The correct shift reveals a readable word.",
            "The shift is between 10 and 15.",
        ],
        key: "Topaz Key",
    },
    Puzzle {
        id: PuzzleId(5),
        title: "DEBUG THE CODE",
        description: "This C program has 5 bugs. Select each buggy line and choose the correct fix.",
        kind: PuzzleKind::Debug { listing: DEBUG_LISTING },
        solution: Solution::Bugs(&[1, 2, 3, 4, 5]),
        hints: [
            "Look at variable initialization, loop bounds, comparisons, statement endings and return values.",
            "The bugs are on lines 5, 6, 28, 34 and 35.",
        ],
        key: "Amethyst Key",
    },
];

const MYSTERY_CODE: &str = "\
FUNCTION mystery(n)
    IF n <= 0 THEN
        RETURN 0
    END IF

    SET result = 0
    FOR i FROM 1 TO n DO
        result = result + i
    END FOR

    RETURN result - n - 3
END FUNCTION

What is mystery(10)?";

const DECODE_ALGORITHM: &str = "\
INPUT: \"XQORFN\"

ALGORITHM DecodeWord:
1. Take the input string
2. For each character in the string:
   a. Find its position in alphabet (A=1, B=2, ... Z=26)
   b. Subtract 3 from the position
   c. If result < 1, wrap around (add 26)
   d. Convert back to letter
3. OUTPUT the decoded string";

const fn line(number: u8, text: &'static str) -> CodeLine {
    CodeLine { number, text, bug: None }
}

const fn buggy(number: u8, text: &'static str, id: u8, fix: &'static str, options: [&'static str; 3]) -> CodeLine {
    CodeLine { number, text, bug: Some(BugFix { id, fix, options }) }
}

static DEBUG_LISTING: &[CodeLine] = &[
    line(1, "#include <stdio.h>"),
    line(2, "#include <stdlib.h>"),
    line(3, ""),
    line(4, "int calculateSum(int arr[], int size) {"),
    buggy(5, "    int sum;", 1, "int sum = 0;", ["int sum = 1;", "int sum = 0;", "float sum;"]),
    buggy(
        6,
        "    for (int i = 0; i <= size; i++) {",
        2,
        "for (int i = 0; i < size; i++) {",
        [
            "for (int i = 0; i < size; i++) {",
            "for (int i = 1; i <= size; i++) {",
            "for (int i = 0; i < size; i--) {",
        ],
    ),
    line(7, "        sum = sum + arr[i];"),
    line(8, "    }"),
    line(9, "    return sum;"),
    line(10, "}"),
    line(11, ""),
    line(12, "void printArray(int arr[], int size) {"),
    line(13, "    printf(\"Array: \");"),
    line(14, "    for (int i = 0; i < size; i++) {"),
    line(15, "        printf(\"%d \", arr[i]);"),
    line(16, "    }"),
    line(17, "    printf(\"\\n\");"),
    line(18, "}"),
    line(19, ""),
    line(20, "int main() {"),
    line(21, "    int numbers[5] = {10, 20, 30, 40, 50};"),
    line(22, "    int size = 5;"),
    line(23, "    int result;"),
    line(24, ""),
    line(25, "    printArray(numbers, size);"),
    line(26, "    result = calculateSum(numbers, size);"),
    line(27, ""),
    buggy(
        28,
        "    if (result = 150) {",
        3,
        "if (result == 150) {",
        ["if (result >= 150) {", "if (result != 150) {", "if (result == 150) {"],
    ),
    line(29, "        printf(\"Sum is correct: %d\\n\", result);"),
    line(30, "    } else {"),
    line(31, "        printf(\"Sum is incorrect\\n\");"),
    line(32, "    }"),
    line(33, ""),
    buggy(
        34,
        "    printf(\"Program complete\\n\")",
        4,
        "printf(\"Program complete\\n\");",
        [
            "printf(\"Program complete\");",
            "printf(\"Program complete\\n\");",
            "print(\"Program complete\\n\");",
        ],
    ),
    buggy(35, "    return;", 5, "return 0;", ["return 0;", "return 1;", "return result;"]),
    line(36, "}"),
];
