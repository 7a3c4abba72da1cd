//! 셸 스타일 key=value 토큰화
//!
//! POSIX 셸 렉서 규칙으로 텍스트를 단어로 나눈 뒤, 각 단어를 첫 `=`에서
//! `(key, value)`로 분리합니다.
//!
//! - 공백(` `, `\t`, `\r`, `\n`)만 단어를 구분하며, 한 단어 안에서 따옴표 구간을 이어 붙일 수 있습니다 (`a="b c"d`)
//! - 작은따옴표: 다음 `'`까지 모든 문자를 그대로 취급
//! - 큰따옴표: `\"`와 `\\`만 이스케이프로 해석
//! - 따옴표 밖의 백슬래시는 다음 문자를 그대로 취급
//! - 닫히지 않은 따옴표나 끝에 남은 백슬래시는 [`ParseError::Tokenization`]
//!
//! `=`가 없는 단어는 무시합니다. `=value`는 빈 키 `""`로 남습니다.

use lognorm_core::error::ParseError;

/// 순서 있는 `(key, raw_value)` 쌍 목록
///
/// 키는 중복될 수 있으며, 병합 시 뒤의 값이 앞의 값을 덮어씁니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet {
    pairs: Vec<(String, String)>,
}

impl TokenSet {
    /// 쌍의 개수를 반환합니다.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// 쌍이 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// 해당 키의 마지막 값을 반환합니다.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 입력 순서대로 쌍을 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl IntoIterator for TokenSet {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

/// 텍스트를 key=value 쌍으로 토큰화합니다.
pub fn tokenize(text: &str) -> Result<TokenSet, ParseError> {
    let pairs = split_words(text)?
        .into_iter()
        .filter_map(|word| {
            word.split_once('=')
                .map(|(key, value)| (key.to_owned(), value.to_owned()))
        })
        .collect();
    Ok(TokenSet { pairs })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// POSIX 셸 렉서 규칙으로 텍스트를 단어로 나눕니다.
pub fn split_words(text: &str) -> Result<Vec<String>, ParseError> {
    let mut words = Vec::new();
    let mut current = String::new();
    // 빈 따옴표(`''`)도 단어를 만들기 때문에 문자 유무와 별도로 추적
    let mut in_word = false;
    let mut quote = Quote::None;
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        match quote {
            Quote::Single => {
                if ch == '\'' {
                    quote = Quote::None;
                } else {
                    current.push(ch);
                }
            }
            Quote::Double => match ch {
                '"' => quote = Quote::None,
                '\\' => match chars.next() {
                    Some(next @ ('"' | '\\')) => current.push(next),
                    Some(next) => {
                        current.push('\\');
                        current.push(next);
                    }
                    None => return Err(ParseError::Tokenization("trailing escape".to_owned())),
                },
                _ => current.push(ch),
            },
            Quote::None => match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                '\'' => {
                    quote = Quote::Single;
                    in_word = true;
                }
                '"' => {
                    quote = Quote::Double;
                    in_word = true;
                }
                '\\' => match chars.next() {
                    Some(next) => {
                        current.push(next);
                        in_word = true;
                    }
                    None => return Err(ParseError::Tokenization("trailing escape".to_owned())),
                },
                _ => {
                    current.push(ch);
                    in_word = true;
                }
            },
        }
    }

    match quote {
        Quote::None => {}
        Quote::Single => {
            return Err(ParseError::Tokenization(
                "unterminated single quote".to_owned(),
            ));
        }
        Quote::Double => {
            return Err(ParseError::Tokenization(
                "unterminated double quote".to_owned(),
            ));
        }
    }

    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(text: &str) -> Vec<(String, String)> {
        tokenize(text).unwrap().into_iter().collect()
    }

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_owned(), v.to_owned())
    }

    #[test]
    fn quoted_value_with_spaces() {
        assert_eq!(
            pairs(r#"src=10.0.0.1 msg="hello world" n=3"#),
            vec![
                pair("src", "10.0.0.1"),
                pair("msg", "hello world"),
                pair("n", "3")
            ]
        );
    }

    #[test]
    fn words_without_equals_are_ignored() {
        assert_eq!(pairs("flag a=1 other"), vec![pair("a", "1")]);
    }

    #[test]
    fn empty_key_is_kept() {
        assert_eq!(pairs("=value b=2"), vec![pair("", "value"), pair("b", "2")]);
    }

    #[test]
    fn unicode_whitespace_does_not_split_words() {
        assert_eq!(pairs("k=a\u{a0}b"), vec![pair("k", "a\u{a0}b")]);
        assert_eq!(pairs("k=a\u{c}b x=1"), vec![pair("k", "a\u{c}b"), pair("x", "1")]);
        assert_eq!(pairs("a=1\r\nb=2\tc=3"), vec![pair("a", "1"), pair("b", "2"), pair("c", "3")]);
    }

    #[test]
    fn mixed_pairs_quotes_and_bare_words() {
        assert_eq!(
            pairs(r#"key1=value1 key2="value with spaces" novalue"#),
            vec![pair("key1", "value1"), pair("key2", "value with spaces")]
        );
    }

    #[test]
    fn splits_on_first_equals_only() {
        assert_eq!(pairs("url=a=b=c"), vec![pair("url", "a=b=c")]);
    }

    #[test]
    fn empty_value_is_kept() {
        assert_eq!(pairs(r#"a= b="""#), vec![pair("a", ""), pair("b", "")]);
    }

    #[test]
    fn concatenated_quotes_form_one_word() {
        assert_eq!(pairs(r#"a="b c"d'e f'"#), vec![pair("a", "b cde f")]);
    }

    #[test]
    fn single_quotes_are_literal() {
        assert_eq!(pairs(r#"a='x\"y'"#), vec![pair("a", r#"x\"y"#)]);
    }

    #[test]
    fn double_quote_escapes() {
        assert_eq!(
            pairs(r#"a="say \"hi\"" b="c:\\dir" c="\n""#),
            vec![pair("a", r#"say "hi""#), pair("b", r"c:\dir"), pair("c", r"\n")]
        );
    }

    #[test]
    fn backslash_outside_quotes_escapes_next() {
        assert_eq!(pairs(r"a=b\ c"), vec![pair("a", "b c")]);
    }

    #[test]
    fn duplicate_keys_are_preserved_in_order() {
        let set = tokenize("a=1 a=2").unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("a"), Some("2"));
    }

    #[test]
    fn unterminated_double_quote_fails() {
        let err = tokenize(r#"a="unterminated"#).unwrap_err();
        assert!(matches!(err, ParseError::Tokenization(_)));
    }

    #[test]
    fn unterminated_single_quote_fails() {
        assert!(tokenize("a='x").is_err());
    }

    #[test]
    fn trailing_backslash_fails() {
        assert!(tokenize("a=b\\").is_err());
    }

    #[test]
    fn empty_input_yields_empty_set() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   \t ").unwrap().is_empty());
    }

    #[test]
    fn split_words_keeps_empty_quoted_word() {
        assert_eq!(split_words("a '' b").unwrap(), vec!["a", "", "b"]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn tokenize_never_panics(text in "\\PC{0,200}") {
                let _ = tokenize(&text);
            }

            #[test]
            fn simple_pairs_round_trip(
                entries in prop::collection::vec(("[a-z]{1,8}", "[a-zA-Z0-9 ]{0,12}"), 0..8)
            ) {
                let text = entries
                    .iter()
                    .map(|(k, v)| format!("{k}=\"{v}\""))
                    .collect::<Vec<_>>()
                    .join(" ");
                let set = tokenize(&text).unwrap();
                let got: Vec<(String, String)> = set.into_iter().collect();
                prop_assert_eq!(got, entries);
            }
        }
    }
}
