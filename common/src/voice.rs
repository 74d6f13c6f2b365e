//! 音声入力テキストの正規化
//!
//! 読み上げられた記号語（"hash", "dot" など）を記号に置き換える。
//! 置換は単語単位・大文字小文字を区別しない。

use regex::Regex;

lazy_static::lazy_static! {
    static ref HASH_RE: Regex = Regex::new(r"(?i)\bhash\b").unwrap();
    static ref HYPHEN_RE: Regex = Regex::new(r"(?i)\bhyphen\b").unwrap();
    static ref DOT_RE: Regex = Regex::new(r"(?i)\bdot\b").unwrap();
    static ref SLASH_RE: Regex = Regex::new(r"(?i)\bslash\b").unwrap();
    static ref COLON_RE: Regex = Regex::new(r"(?i)\bcolon\b").unwrap();
    static ref COMMA_RE: Regex = Regex::new(r"(?i)\bcomma\b").unwrap();
    static ref AT_RE: Regex = Regex::new(r"(?i)\bat\b").unwrap();
    static ref PERCENT_RE: Regex = Regex::new(r"(?i)\bpercent\b").unwrap();
    static ref AND_RE: Regex = Regex::new(r"(?i)\band\b").unwrap();
}

/// 認識結果を正規化する
///
/// "dot" は最初の1語だけを置換する。既に "." を含むテキストでは置換しないので、
/// 正規化済みテキストを再度通しても結果は変わらない。
pub fn normalize_spoken_text(text: &str) -> String {
    let text = HASH_RE.replace_all(text, "#");
    let text = HYPHEN_RE.replace_all(&text, "-");
    let text = if text.contains('.') {
        text
    } else {
        std::borrow::Cow::Owned(DOT_RE.replace(&text, ".").into_owned())
    };
    let text = SLASH_RE.replace_all(&text, "/");
    let text = COLON_RE.replace_all(&text, ":");
    let text = COMMA_RE.replace_all(&text, ",");
    let text = AT_RE.replace_all(&text, "@");
    let text = PERCENT_RE.replace_all(&text, "%");
    let text = AND_RE.replace_all(&text, "");
    text.trim().to_string()
}
