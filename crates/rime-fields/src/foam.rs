//! ASCII field file parsing and editing.
//!
//! Only the parts of the format the coupling engine touches are handled:
//! the `internalField` entry, the `value` entry of one boundary patch, and
//! the `endTime` entry of the run control file.

/// Parsed values of one field entry.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValues {
    Scalar(Vec<f64>),
    Vector(Vec<[f64; 3]>),
}

impl FieldValues {
    pub fn len(&self) -> usize {
        match self {
            FieldValues::Scalar(v) => v.len(),
            FieldValues::Vector(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, FieldValues::Vector(_))
    }
}

/// How to treat list entries that do not parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseMode {
    /// Skip bad entries and count them.
    Lenient,
    /// Fail on the first bad entry or a count mismatch.
    Strict,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParsedField {
    pub values: FieldValues,
    /// Entries dropped in lenient mode.
    pub skipped: usize,
    pub uniform: bool,
}

/// Byte offset of `word` where it stands as a whole identifier.
fn find_keyword(text: &str, word: &str) -> Option<usize> {
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
    let mut from = 0;
    while let Some(pos) = text[from..].find(word) {
        let start = from + pos;
        let end = start + word.len();
        let before_ok = text[..start].chars().next_back().is_none_or(|c| !is_ident(c));
        let after_ok = text[end..].chars().next().is_none_or(|c| !is_ident(c));
        if before_ok && after_ok {
            return Some(start);
        }
        from = end;
    }
    None
}

/// Split `s` (starting just after an opening bracket) at its matching close.
fn matched_body(s: &str, open: char, close: char) -> Option<(&str, &str)> {
    let mut depth = 1usize;
    for (i, c) in s.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some((&s[..i], &s[i + c.len_utf8()..]));
            }
        }
    }
    None
}

fn parse_vector(group: &str) -> Option<[f64; 3]> {
    let comps: Vec<f64> = group
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<Result<_, _>>()
        .ok()?;
    match comps.as_slice() {
        [a, b, c] => Some([*a, *b, *c]),
        _ => None,
    }
}

/// Parse the value of an entry, `s` starting right after its keyword.
fn parse_value_entry(s: &str, mode: ParseMode) -> Result<ParsedField, String> {
    let s = s.trim_start();

    if let Some(rest) = s.strip_prefix("uniform") {
        let rest = rest.trim_start();
        if let Some(inner) = rest.strip_prefix('(') {
            let (group, _) = matched_body(inner, '(', ')').ok_or("unterminated uniform vector")?;
            let v = parse_vector(group).ok_or_else(|| format!("bad uniform vector '({group})'"))?;
            return Ok(ParsedField {
                values: FieldValues::Vector(vec![v]),
                skipped: 0,
                uniform: true,
            });
        }
        let token = rest.split(';').next().unwrap_or("").trim();
        let v: f64 = token
            .parse()
            .map_err(|_| format!("bad uniform scalar '{token}'"))?;
        return Ok(ParsedField {
            values: FieldValues::Scalar(vec![v]),
            skipped: 0,
            uniform: true,
        });
    }

    let rest = s
        .strip_prefix("nonuniform")
        .ok_or("expected 'uniform' or 'nonuniform'")?
        .trim_start();
    let type_end = rest
        .find(|c: char| c.is_whitespace() || c == '(')
        .unwrap_or(rest.len());
    let is_vector = match &rest[..type_end] {
        "List<scalar>" => false,
        "List<vector>" => true,
        other => return Err(format!("unsupported list type '{other}'")),
    };
    let rest = &rest[type_end..];

    let open = rest.find('(').ok_or("list has no opening parenthesis")?;
    let count_token = rest[..open].trim();
    let declared = if count_token.is_empty() {
        None
    } else {
        Some(
            count_token
                .parse::<usize>()
                .map_err(|_| format!("bad list size '{count_token}'"))?,
        )
    };
    let (body, _) = matched_body(&rest[open + 1..], '(', ')').ok_or("unterminated list")?;

    let mut skipped = 0;
    let values = if is_vector {
        let mut out = Vec::new();
        let mut cursor = body;
        while let Some(start) = cursor.find('(') {
            if mode == ParseMode::Strict && !cursor[..start].trim().is_empty() {
                return Err(format!("stray text '{}' in vector list", cursor[..start].trim()));
            }
            let (group, after) =
                matched_body(&cursor[start + 1..], '(', ')').ok_or("unterminated vector")?;
            match parse_vector(group) {
                Some(v) => out.push(v),
                None if mode == ParseMode::Lenient => skipped += 1,
                None => return Err(format!("bad vector '({group})'")),
            }
            cursor = after;
        }
        FieldValues::Vector(out)
    } else {
        let mut out = Vec::new();
        for token in body.split_whitespace() {
            match token.parse::<f64>() {
                Ok(v) => out.push(v),
                Err(_) if mode == ParseMode::Lenient => skipped += 1,
                Err(_) => return Err(format!("bad scalar '{token}'")),
            }
        }
        FieldValues::Scalar(out)
    };

    if mode == ParseMode::Strict {
        if let Some(n) = declared {
            if n != values.len() {
                return Err(format!("list declares {n} entries but holds {}", values.len()));
            }
        }
    }

    Ok(ParsedField {
        values,
        skipped,
        uniform: false,
    })
}

/// Parse the `internalField` entry of a field file.
pub fn parse_internal_field(text: &str, mode: ParseMode) -> Result<ParsedField, String> {
    let start = find_keyword(text, "internalField").ok_or("no internalField entry")?;
    parse_value_entry(&text[start + "internalField".len()..], mode)
}

/// Parse the `value` entry of boundary patch `patch`.
pub fn parse_patch_value(text: &str, patch: &str, mode: ParseMode) -> Result<ParsedField, String> {
    let bf = find_keyword(text, "boundaryField").ok_or("no boundaryField entry")?;
    let boundary = &text[bf..];
    let p = find_keyword(boundary, patch).ok_or_else(|| format!("no patch '{patch}'"))?;
    let after = &boundary[p + patch.len()..];
    let open = after
        .find('{')
        .ok_or_else(|| format!("patch '{patch}' has no body"))?;
    let (body, _) = matched_body(&after[open + 1..], '{', '}')
        .ok_or_else(|| format!("patch '{patch}' is unterminated"))?;
    let v = find_keyword(body, "value").ok_or_else(|| format!("patch '{patch}' has no value"))?;
    parse_value_entry(&body[v + "value".len()..], mode)
}

fn format_internal_field(values: &FieldValues) -> String {
    let mut out = String::new();
    match values {
        FieldValues::Scalar(v) => {
            out.push_str(&format!("internalField   nonuniform List<scalar>\n{}\n(\n", v.len()));
            for x in v {
                out.push_str(&format!("{x}\n"));
            }
        }
        FieldValues::Vector(v) => {
            out.push_str(&format!("internalField   nonuniform List<vector>\n{}\n(\n", v.len()));
            for [a, b, c] in v {
                out.push_str(&format!("({a} {b} {c})\n"));
            }
        }
    }
    out.push_str(")\n;");
    out
}

/// Replace the `internalField` entry (uniform or not) with `values`.
pub fn replace_internal_field(text: &str, values: &FieldValues) -> Result<String, String> {
    let start = find_keyword(text, "internalField").ok_or("no internalField entry")?;
    let mut depth = 0i32;
    let mut end = None;
    for (i, c) in text[start..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ';' if depth == 0 => {
                end = Some(start + i);
                break;
            }
            _ => {}
        }
    }
    let end = end.ok_or("internalField entry is unterminated")?;

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..start]);
    out.push_str(&format_internal_field(values));
    out.push_str(&text[end + 1..]);
    Ok(out)
}

/// Rewrite every `endTime` entry of a run control file.
pub fn set_end_time(text: &str, end_time: f64) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        if find_keyword(line, "endTime").is_some() && !line.contains("stopAt") {
            out.push_str(&format!("endTime         {end_time};"));
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCALAR_FILE: &str = r#"
FoamFile
{
    class       volScalarField;
    object      p;
}
dimensions      [1 -1 -2 0 0 0 0];

internalField   nonuniform List<scalar>
4
(
1.5
2.5
garbage
-3
)
;

boundaryField
{
    inlet
    {
        type            fixedValue;
        value           uniform 611.657;
    }
    outerwall
    {
        type            calculated;
        value           nonuniform List<scalar> 2(0.1 0.2);
    }
}
"#;

    const VECTOR_FILE: &str = r#"
internalField   nonuniform List<vector>
3
(
(1 0 0)
(0 2 0)
(bad 1 2)
)
;
boundaryField
{
    outerwall_side
    {
        value uniform (9 9 9);
    }
    outerwall
    {
        type calculated;
        value nonuniform List<vector> 2((0.1 1.0 0.5) (0.2 1.1 0.5));
    }
}
"#;

    #[test]
    fn lenient_scalar_skips_garbage() {
        let parsed = parse_internal_field(SCALAR_FILE, ParseMode::Lenient).unwrap();
        assert_eq!(parsed.values, FieldValues::Scalar(vec![1.5, 2.5, -3.0]));
        assert_eq!(parsed.skipped, 1);
        assert!(!parsed.uniform);
    }

    #[test]
    fn strict_scalar_rejects_garbage() {
        let err = parse_internal_field(SCALAR_FILE, ParseMode::Strict).unwrap_err();
        assert!(err.contains("garbage"));
    }

    #[test]
    fn lenient_vector_skips_bad_entries() {
        let parsed = parse_internal_field(VECTOR_FILE, ParseMode::Lenient).unwrap();
        assert_eq!(
            parsed.values,
            FieldValues::Vector(vec![[1.0, 0.0, 0.0], [0.0, 2.0, 0.0]])
        );
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn patch_lookup_matches_whole_name() {
        let parsed = parse_patch_value(VECTOR_FILE, "outerwall", ParseMode::Strict).unwrap();
        assert_eq!(
            parsed.values,
            FieldValues::Vector(vec![[0.1, 1.0, 0.5], [0.2, 1.1, 0.5]])
        );
        let scalar = parse_patch_value(SCALAR_FILE, "outerwall", ParseMode::Strict).unwrap();
        assert_eq!(scalar.values, FieldValues::Scalar(vec![0.1, 0.2]));
    }

    #[test]
    fn uniform_entries() {
        let parsed = parse_patch_value(SCALAR_FILE, "inlet", ParseMode::Strict).unwrap();
        assert!(parsed.uniform);
        assert_eq!(parsed.values, FieldValues::Scalar(vec![611.657]));
        let text = "internalField uniform (1 2 3);";
        let parsed = parse_internal_field(text, ParseMode::Strict).unwrap();
        assert_eq!(parsed.values, FieldValues::Vector(vec![[1.0, 2.0, 3.0]]));
    }

    #[test]
    fn truncated_list_is_an_error_in_both_modes() {
        let text = "internalField nonuniform List<scalar> 3 (1 2";
        assert!(parse_internal_field(text, ParseMode::Lenient).is_err());
        assert!(parse_internal_field(text, ParseMode::Strict).is_err());
    }

    #[test]
    fn strict_checks_declared_count() {
        let text = "internalField nonuniform List<scalar> 3 (1 2);";
        assert!(parse_internal_field(text, ParseMode::Strict).is_err());
        assert!(parse_internal_field(text, ParseMode::Lenient).is_ok());
    }

    #[test]
    fn replace_then_parse_gives_new_values() {
        let values = FieldValues::Scalar(vec![10.0, 20.0]);
        let edited = replace_internal_field(SCALAR_FILE, &values).unwrap();
        let parsed = parse_internal_field(&edited, ParseMode::Strict).unwrap();
        assert_eq!(parsed.values, values);
        // boundary entries are untouched
        let inlet = parse_patch_value(&edited, "inlet", ParseMode::Strict).unwrap();
        assert_eq!(inlet.values, FieldValues::Scalar(vec![611.657]));
    }

    #[test]
    fn replace_uniform_with_vectors() {
        let text = "dimensions [0 1 -1 0 0 0 0];\ninternalField   uniform (0 0 0);\nboundaryField {}\n";
        let values = FieldValues::Vector(vec![[300.0, 0.0, 0.0], [310.5, 0.0, 0.0]]);
        let edited = replace_internal_field(text, &values).unwrap();
        assert!(edited.starts_with("dimensions"));
        assert!(edited.contains("(310.5 0 0)"));
        assert!(edited.contains("boundaryField"));
    }

    #[test]
    fn end_time_rewrite_leaves_stop_at() {
        let text = "stopAt          endTime;\nendTime         10;\ndeltaT 1e-8;\n";
        let out = set_end_time(text, 0.5);
        assert_eq!(out, "stopAt          endTime;\nendTime         0.5;\ndeltaT 1e-8;\n");
    }
}
