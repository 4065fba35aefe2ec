//! Suffix-stripping stemmer over ASCII letters.
//!
//! The ranking engine and the synonym table both key on these stems, so the
//! exact rule set matters: plural `s` is kept after `us`/`ss`/`ous`, a final
//! `e` survives after `c`, and there is no exception list. Swapping in a
//! library Porter2 implementation would silently shift recall.

/// Marked `Y` counts as a vowel for region and pattern checks; an unmarked
/// `y` counts as a consonant.
fn is_vowel(s: &[u8], i: usize) -> bool {
    matches!(s[i], b'a' | b'e' | b'i' | b'o' | b'u' | b'Y')
}

/// Working buffer with the R1/R2 region boundaries kept alongside the bytes.
/// Every mutation that can move a region boundary recomputes both.
struct StemBuf {
    s: Vec<u8>,
    r1: usize,
    r2: usize,
}

impl StemBuf {
    fn new(s: Vec<u8>) -> Self {
        let mut buf = Self { s, r1: 0, r2: 0 };
        buf.recompute();
        buf
    }

    /// R1 starts after the first vowel-to-non-vowel transition; R2 repeats
    /// the scan inside R1.
    fn recompute(&mut self) {
        let n = self.s.len();
        self.r1 = n;
        for i in 0..n.saturating_sub(1) {
            if is_vowel(&self.s, i) && !is_vowel(&self.s, i + 1) {
                self.r1 = i + 2;
                break;
            }
        }
        self.r2 = n;
        let mut i = self.r1;
        while i + 1 < n {
            if is_vowel(&self.s, i) && !is_vowel(&self.s, i + 1) {
                self.r2 = i + 2;
                break;
            }
            i += 1;
        }
    }

    fn len(&self) -> usize {
        self.s.len()
    }

    fn byte(&self, i: usize) -> u8 {
        self.s[i]
    }

    fn ends(&self, suffix: &str) -> bool {
        self.s.ends_with(suffix.as_bytes())
    }

    fn in_r1(&self, pos: usize) -> bool {
        pos >= self.r1
    }

    fn in_r2(&self, pos: usize) -> bool {
        pos >= self.r2
    }

    fn drop_tail(&mut self, count: usize) {
        let keep = self.s.len() - count;
        self.s.truncate(keep);
        self.recompute();
    }

    fn replace_tail(&mut self, count: usize, replacement: &str) {
        let keep = self.s.len() - count;
        self.s.truncate(keep);
        self.s.extend_from_slice(replacement.as_bytes());
        self.recompute();
    }

    fn push(&mut self, b: u8) {
        self.s.push(b);
        self.recompute();
    }

    fn has_vowel(&self, upto: usize) -> bool {
        (0..upto.min(self.s.len())).any(|i| is_vowel(&self.s, i))
    }
}

const STEP2: &[(&str, &str)] = &[
    ("ization", "ize"),
    ("ational", "ate"),
    ("fulness", "ful"),
    ("ousness", "ous"),
    ("iveness", "ive"),
    ("tional", "tion"),
    ("biliti", "ble"),
    ("lessli", "less"),
    ("entli", "ent"),
    ("ation", "ate"),
    ("aliti", "al"),
    ("iviti", "ive"),
    ("fulli", "ful"),
    ("enci", "ence"),
    ("anci", "ance"),
    ("abli", "able"),
    ("izer", "ize"),
    ("alli", "al"),
    ("bli", "ble"),
    ("ogi", "og"),
    ("li", ""),
];

const STEP3: &[(&str, &str)] = &[
    ("ational", "ate"),
    ("tional", "tion"),
    ("alize", "al"),
    ("icate", "ic"),
    ("iciti", "ic"),
    ("ical", "ic"),
    ("ful", ""),
    ("ness", ""),
    ("ative", ""),
];

const STEP4: &[&str] = &[
    "ement", "ment", "able", "ible", "ance", "ence", "ate", "iti", "ous", "ive", "ize", "al",
    "er", "ic", "ant", "ent",
];

/// Stem a single word. Words of length <= 2 pass through unchanged; leading
/// and trailing non-ASCII-letter characters are trimmed first. Deterministic
/// and allocation-local.
pub fn stem(word: &str) -> String {
    if word.chars().count() <= 2 {
        return word.to_string();
    }
    let lowered = word.to_lowercase();
    let trimmed = lowered.trim_matches(|c: char| !c.is_ascii_alphabetic());
    if trimmed.chars().count() <= 2 {
        return trimmed.to_string();
    }

    // Retained unmarked form, used to restore an -ed/-ing suffix when
    // stripping it would leave a vowelless remainder.
    let original: Vec<u8> = trimmed.bytes().collect();

    let mut marked = original.clone();
    for i in 0..marked.len() {
        if marked[i] == b'y' && (i == 0 || matches!(marked[i - 1], b'a' | b'e' | b'i' | b'o' | b'u')) {
            marked[i] = b'Y';
        }
    }
    let mut b = StemBuf::new(marked);

    // (a) possessive markers
    if b.ends("'s'") {
        b.drop_tail(3);
    } else if b.ends("'s") {
        b.drop_tail(2);
    } else if b.ends("'") {
        b.drop_tail(1);
    }

    // (b) plural-s and -ied/-ies endings
    if b.ends("sses") {
        b.replace_tail(4, "ss");
    } else if b.ends("ied") || b.ends("ies") {
        let stem_len = b.len() - 3;
        if stem_len > 1 {
            b.replace_tail(3, "i");
        } else {
            b.replace_tail(3, "ie");
        }
    } else if b.ends("us") || b.ends("ss") {
        // keep as-is
    } else if b.ends("s") {
        let has_vowel = b.has_vowel(b.len() - 1);
        if has_vowel && b.byte(b.len() - 2) != b's' && !b.ends("ous") {
            b.drop_tail(1);
        }
    }

    // (c) -eed(ly) collapse, else -ing/-ed stripping with fixups
    let mut stripped_inflection = false;
    let eedly = b.ends("eedly") && b.in_r1(b.len() - 5);
    let eed = b.ends("eed") && b.in_r1(b.len() - 3);
    if eedly || eed {
        if b.ends("eedly") {
            b.replace_tail(5, "ee");
        } else {
            b.replace_tail(3, "ee");
        }
    } else {
        let mut removed = false;
        if b.ends("ingly") || b.ends("edly") || b.ends("ing") || b.ends("ed") {
            let old_len = b.len();
            if b.ends("ingly") {
                b.drop_tail(5);
            } else if b.ends("edly") {
                b.drop_tail(4);
            } else if b.ends("ing") {
                b.drop_tail(3);
            } else {
                b.drop_tail(2);
            }
            if b.has_vowel(b.len()) {
                removed = true;
            } else {
                // restore the suffix as it appeared in the unprocessed word
                let cut = old_len - b.len();
                let tail = original[original.len() - cut..].to_vec();
                for byte in tail {
                    b.push(byte);
                }
            }
        }
        if removed {
            if b.ends("at") || b.ends("bl") || b.ends("iz") {
                b.push(b'e');
            } else if b.len() >= 2
                && b.byte(b.len() - 1) == b.byte(b.len() - 2)
                && !matches!(b.byte(b.len() - 1), b'l' | b's' | b'z')
            {
                b.drop_tail(1);
            } else if b.len() >= 3 {
                let n = b.len();
                let cvc = !is_vowel(&b.s, n - 3) && is_vowel(&b.s, n - 2) && !is_vowel(&b.s, n - 1);
                if cvc && !matches!(b.byte(n - 1), b'w' | b'x' | b'y') {
                    b.push(b'e');
                }
            }
            stripped_inflection = true;
        }
    }

    // (d) terminal y after a consonant becomes i, only when (c) stripped nothing
    if !stripped_inflection && b.len() >= 2 {
        let last = b.byte(b.len() - 1);
        if (last == b'y' || last == b'Y') && !is_vowel(&b.s, b.len() - 2) {
            let at = b.len() - 1;
            b.s[at] = b'i';
            b.recompute();
        }
    }

    // (e) first derivational table, gated on R1
    for (suffix, replacement) in STEP2 {
        if b.ends(suffix) {
            let pos = b.len() - suffix.len();
            if b.in_r1(pos) {
                match *suffix {
                    "ogi" => {
                        if pos > 0 && b.byte(pos - 1) == b'l' {
                            b.replace_tail(suffix.len(), replacement);
                        }
                    }
                    "li" => {
                        if pos > 0
                            && matches!(
                                b.byte(pos - 1),
                                b'c' | b'd' | b'e' | b'g' | b'h' | b'k' | b'm' | b'n' | b'r' | b't'
                            )
                        {
                            b.replace_tail(suffix.len(), replacement);
                        }
                    }
                    _ => b.replace_tail(suffix.len(), replacement),
                }
            }
            break;
        }
    }

    // (f) second derivational table, -ative additionally gated on R2
    for (suffix, replacement) in STEP3 {
        if b.ends(suffix) {
            let pos = b.len() - suffix.len();
            if b.in_r1(pos) {
                if *suffix == "ative" {
                    if b.in_r2(pos) {
                        b.replace_tail(suffix.len(), replacement);
                    }
                } else {
                    b.replace_tail(suffix.len(), replacement);
                }
            }
            break;
        }
    }

    // (g) residual suffixes inside R2, with the s/t-gated -ion case
    let mut removed_residual = false;
    for suffix in STEP4 {
        if b.ends(suffix) {
            let pos = b.len() - suffix.len();
            if b.in_r2(pos) {
                b.drop_tail(suffix.len());
                removed_residual = true;
            }
            break;
        }
    }
    if !removed_residual && b.ends("ion") {
        let pos = b.len() - 3;
        if b.in_r2(pos) && pos > 0 && matches!(b.byte(pos - 1), b's' | b't') {
            b.drop_tail(3);
        }
    }

    // (h) terminal e, kept after c when only in R1
    if b.ends("e") {
        let pos = b.len() - 1;
        let after_c = b.len() >= 2 && b.byte(b.len() - 2) == b'c';
        if b.in_r2(pos) || (b.in_r1(pos) && !after_c) {
            b.drop_tail(1);
        }
    }

    // (i) doubled terminal l inside R2
    if b.ends("l") {
        let pos = b.len() - 1;
        if b.in_r2(pos) && b.len() >= 2 && b.byte(b.len() - 2) == b'l' {
            b.drop_tail(1);
        }
    }

    for byte in &mut b.s {
        if *byte == b'Y' {
            *byte = b'y';
        }
    }
    String::from_utf8_lossy(&b.s).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(stem("caresses"), "caress");
        assert_eq!(stem("ties"), "tie");
        assert_eq!(stem("cats"), "cat");
        assert_eq!(stem("ponies"), "poni");
    }

    #[test]
    fn inflection_stripping() {
        assert_eq!(stem("running"), "run");
        assert_eq!(stem("agreed"), stem("agree"));
    }

    #[test]
    fn idempotent_on_stemmed_forms() {
        for word in ["caresses", "ties", "running", "capital"] {
            let once = stem(word);
            assert_eq!(stem(&once), once, "restemming {word}");
        }
    }

    #[test]
    fn short_words_pass_through() {
        assert_eq!(stem("go"), "go");
        assert_eq!(stem("of"), "of");
    }

    #[test]
    fn possessives() {
        assert_eq!(stem("dog's"), "dog");
    }

    #[test]
    fn keeps_e_after_c() {
        assert_eq!(stem("france"), "france");
    }

    #[test]
    fn plural_guards() {
        // us/ss/ous endings keep their s
        assert_eq!(stem("virus"), "virus");
        assert_eq!(stem("caress"), "caress");
    }
}
