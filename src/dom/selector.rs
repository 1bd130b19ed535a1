//! Selector parsing and matching for the page element tree.
//!
//! Supports the subset the projectors bind with: tag names, `#id`,
//! `.class`, attribute presence and case-insensitive substring matchers
//! (`[aria-label*="whatsapp" i]`), compounds of those, the descendant
//! combinator, and comma-separated lists.

use thiserror::Error;

use super::Element;

/// Selector parse failure. Callers treat unparsable selectors as matching
/// nothing; absence of a target on a given page is expected.
#[derive(Error, Debug)]
#[error("Invalid selector '{selector}': {message}")]
pub struct SelectorParseError {
    pub selector: String,
    pub message: String,
}

/// A comma-separated list of selectors; matches if any member matches.
#[derive(Debug, Clone)]
pub struct SelectorList {
    selectors: Vec<Selector>,
}

/// A descendant chain of compounds, e.g. `.badge span`.
#[derive(Debug, Clone)]
struct Selector {
    compounds: Vec<Compound>,
}

/// One simple-selector group, e.g. `a[aria-label*="Email" i]`.
#[derive(Debug, Clone, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatcher>,
}

#[derive(Debug, Clone)]
struct AttrMatcher {
    name: String,
    op: AttrOp,
}

#[derive(Debug, Clone)]
enum AttrOp {
    Present,
    Contains { value: String, case_insensitive: bool },
}

impl SelectorList {
    /// Parses a comma-separated selector list.
    pub fn parse(input: &str) -> Result<Self, SelectorParseError> {
        let mut selectors = Vec::new();

        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(err(input, "empty selector in list"));
            }

            let compounds = split_compounds(part)
                .into_iter()
                .map(|compound| parse_compound(input, compound))
                .collect::<Result<Vec<_>, _>>()?;

            selectors.push(Selector { compounds });
        }

        if selectors.is_empty() {
            return Err(err(input, "empty selector"));
        }

        Ok(Self { selectors })
    }

    pub(super) fn max_prefix(&self) -> Vec<usize> {
        self.selectors.iter().map(|s| s.compounds.len()).collect()
    }

    /// Advances the descendant-match state for one element.
    ///
    /// `active[i]` holds, per selector, the prefix lengths already matched
    /// by ancestors. Returns the open prefixes for descendants and whether
    /// this element itself completed any selector. Completion is never
    /// carried into the descendant state: a match does not make the whole
    /// subtree match.
    pub(super) fn advance(
        &self,
        element: &Element,
        active: &[Vec<usize>],
    ) -> (Vec<Vec<usize>>, bool) {
        let mut next = Vec::with_capacity(self.selectors.len());
        let mut hit = false;

        for (selector, ancestors_matched) in self.selectors.iter().zip(active) {
            let full = selector.compounds.len();
            let mut states = ancestors_matched.clone();
            for &prefix in ancestors_matched {
                if prefix < full && selector.compounds[prefix].matches(element) {
                    let reached = prefix + 1;
                    if reached == full {
                        hit = true;
                    } else if !states.contains(&reached) {
                        states.push(reached);
                    }
                }
            }
            next.push(states);
        }

        (next, hit)
    }
}

impl Compound {
    fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if !element.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        if let Some(id) = &self.id {
            if element.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }

        for class in &self.classes {
            if !element.classes.iter().any(|c| c == class) {
                return false;
            }
        }

        for attr in &self.attrs {
            let value = match element.attrs.get(&attr.name) {
                Some(v) => v,
                None => return false,
            };
            match &attr.op {
                AttrOp::Present => {}
                AttrOp::Contains {
                    value: needle,
                    case_insensitive,
                } => {
                    let matched = if *case_insensitive {
                        value.to_lowercase().contains(&needle.to_lowercase())
                    } else {
                        value.contains(needle.as_str())
                    };
                    if !matched {
                        return false;
                    }
                }
            }
        }

        true
    }
}

/// Splits a selector into its descendant compounds. Whitespace separates
/// compounds only outside attribute brackets, so values like
/// `[aria-label*="por WhatsApp" i]` stay in one piece.
fn split_compounds(part: &str) -> Vec<&str> {
    let mut compounds = Vec::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut start: Option<usize> = None;

    for (i, c) in part.char_indices() {
        match c {
            '"' if depth > 0 => in_quote = !in_quote,
            '[' if !in_quote => depth += 1,
            ']' if !in_quote => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 && !in_quote => {
                if let Some(s) = start.take() {
                    compounds.push(&part[s..i]);
                }
                continue;
            }
            _ => {}
        }
        if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        compounds.push(&part[s..]);
    }

    compounds
}

fn parse_compound(whole: &str, input: &str) -> Result<Compound, SelectorParseError> {
    let mut compound = Compound::default();
    let mut chars = input.chars().peekable();

    // Leading tag name, if any.
    let mut tag = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '-' {
            tag.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if !tag.is_empty() {
        compound.tag = Some(tag);
    }

    while let Some(c) = chars.next() {
        match c {
            '#' => {
                let name = take_name(&mut chars);
                if name.is_empty() {
                    return Err(err(whole, "missing id after '#'"));
                }
                compound.id = Some(name);
            }
            '.' => {
                let name = take_name(&mut chars);
                if name.is_empty() {
                    return Err(err(whole, "missing class after '.'"));
                }
                compound.classes.push(name);
            }
            '[' => {
                let mut body = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(c) => body.push(c),
                        None => return Err(err(whole, "unterminated attribute selector")),
                    }
                }
                compound.attrs.push(parse_attr(whole, &body)?);
            }
            other => {
                return Err(err(whole, &format!("unexpected character '{}'", other)));
            }
        }
    }

    if compound.tag.is_none()
        && compound.id.is_none()
        && compound.classes.is_empty()
        && compound.attrs.is_empty()
    {
        return Err(err(whole, "empty compound"));
    }

    Ok(compound)
}

fn parse_attr(whole: &str, body: &str) -> Result<AttrMatcher, SelectorParseError> {
    let body = body.trim();

    if let Some(pos) = body.find("*=") {
        let name = body[..pos].trim().to_string();
        let mut rest = body[pos + 2..].trim();

        let case_insensitive = if let Some(stripped) = rest.strip_suffix(" i") {
            rest = stripped.trim_end();
            true
        } else {
            false
        };

        let value = rest
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .unwrap_or(rest)
            .to_string();

        if name.is_empty() {
            return Err(err(whole, "missing attribute name"));
        }

        Ok(AttrMatcher {
            name,
            op: AttrOp::Contains {
                value,
                case_insensitive,
            },
        })
    } else {
        if body.is_empty() {
            return Err(err(whole, "empty attribute selector"));
        }
        Ok(AttrMatcher {
            name: body.to_string(),
            op: AttrOp::Present,
        })
    }
}

fn take_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    name
}

fn err(selector: &str, message: &str) -> SelectorParseError {
    SelectorParseError {
        selector: selector.to_string(),
        message: message.to_string(),
    }
}
