//! Line composer: interleave text spans with rendered numeric fields.
//!
//! Ordering is positional. When the line's first numeric field starts at byte
//! zero the sequence is number, text, number, text...; otherwise text leads.
//! Whichever side runs out first simply stops contributing.

use crate::style::Span;

pub fn compose(texts: &[&str], numbers: Vec<Vec<Span>>, first_is_number: bool) -> Vec<Span> {
    let mut out = Vec::with_capacity(texts.len() + numbers.len() * 2);
    let mut texts = texts.iter();
    let mut numbers = numbers.into_iter();
    loop {
        let (text, number) = (texts.next(), numbers.next());
        if text.is_none() && number.is_none() {
            break;
        }
        let text = text.map(|t| Span::plain(*t));
        if first_is_number {
            out.extend(number.into_iter().flatten());
            out.extend(text);
        } else {
            out.extend(text);
            out.extend(number.into_iter().flatten());
        }
    }
    out.retain(|s| !s.is_empty());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::plain_text;
    use crossterm::style::Color;
    use pretty_assertions::assert_eq;

    fn num(text: &str) -> Vec<Span> {
        vec![Span::colored(text, Color::Blue)]
    }

    #[test]
    fn text_leads_when_line_starts_with_text() {
        let out = compose(&["cpu: ", " "], vec![num("5"), num("10")], false);
        assert_eq!(plain_text(&out), "cpu: 5 10");
        assert_eq!(out[0], Span::plain("cpu: "));
    }

    #[test]
    fn number_leads_when_line_starts_with_number() {
        let out = compose(&[" apples ", " pears"], vec![num("12"), num("3")], true);
        assert_eq!(plain_text(&out), "12 apples 3 pears");
        assert_eq!(out[0], Span::colored("12", Color::Blue));
    }

    #[test]
    fn surplus_on_either_side_is_appended() {
        let out = compose(&["a "], vec![num("1"), num("2")], false);
        assert_eq!(plain_text(&out), "a 12");
        let out = compose(&["x ", " y", " z"], vec![num("1")], false);
        assert_eq!(plain_text(&out), "x 1 y z");
    }

    #[test]
    fn empty_renders_are_dropped() {
        let out = compose(&["a ", " b"], vec![Vec::new(), num("2")], false);
        assert_eq!(out.len(), 3);
        assert_eq!(plain_text(&out), "a  b2");
    }
}
