//! Mixed-script tokenizer for the search index.
//!
//! ASCII alphanumeric runs become whole lowercase word tokens. Everything
//! else that is still alphanumeric (Japanese, Korean, Chinese, accented
//! scripts) is tokenized as every overlapping bigram AND every individual
//! character: bigrams give substring-like matching, single characters keep
//! one-character queries findable, which pure bigram indexing would miss.

use tantivy::tokenizer::{Token, TokenStream, Tokenizer};

fn is_cjk_like(c: char) -> bool {
    c.is_alphanumeric() && !c.is_ascii_alphanumeric()
}

/// Produce the token texts for one input string, in order.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch.is_ascii_alphanumeric() {
            let mut word = String::new();
            while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                word.push(chars[i].to_ascii_lowercase());
                i += 1;
            }
            tokens.push(word);
        } else if is_cjk_like(ch) {
            tokens.push(ch.to_lowercase().collect());
            if i + 1 < chars.len() && is_cjk_like(chars[i + 1]) {
                let bigram: String = [ch, chars[i + 1]].iter().collect::<String>().to_lowercase();
                tokens.push(bigram);
            }
            i += 1;
        } else {
            i += 1;
        }
    }
    tokens
}

struct TokenData {
    text: String,
    offset_from: usize,
    offset_to: usize,
}

/// Garden tokenizer, registered with tantivy under the `"garden"` key.
#[derive(Clone, Default)]
pub struct GardenTokenizer;

pub struct GardenTokenStream {
    tokens: Vec<TokenData>,
    index: usize,
    token: Token,
}

impl Tokenizer for GardenTokenizer {
    type TokenStream<'a> = GardenTokenStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        let mut tokens = Vec::new();
        let chars: Vec<char> = text.chars().collect();
        let mut offset = 0;
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            if ch.is_ascii_alphanumeric() {
                let word_start = offset;
                let mut word = String::new();
                while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                    word.push(chars[i].to_ascii_lowercase());
                    offset += chars[i].len_utf8();
                    i += 1;
                }
                tokens.push(TokenData {
                    text: word,
                    offset_from: word_start,
                    offset_to: offset,
                });
            } else if is_cjk_like(ch) {
                let char_len = ch.len_utf8();
                tokens.push(TokenData {
                    text: ch.to_lowercase().collect(),
                    offset_from: offset,
                    offset_to: offset + char_len,
                });
                if i + 1 < chars.len() && is_cjk_like(chars[i + 1]) {
                    let next_len = chars[i + 1].len_utf8();
                    let bigram: String =
                        [ch, chars[i + 1]].iter().collect::<String>().to_lowercase();
                    tokens.push(TokenData {
                        text: bigram,
                        offset_from: offset,
                        offset_to: offset + char_len + next_len,
                    });
                }
                offset += char_len;
                i += 1;
            } else {
                offset += ch.len_utf8();
                i += 1;
            }
        }

        GardenTokenStream {
            tokens,
            index: 0,
            token: Token::default(),
        }
    }
}

impl TokenStream for GardenTokenStream {
    fn advance(&mut self) -> bool {
        if self.index < self.tokens.len() {
            let data = &self.tokens[self.index];
            self.token = Token {
                offset_from: data.offset_from,
                offset_to: data.offset_to,
                position: self.index,
                text: data.text.clone(),
                position_length: 1,
            };
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn token(&self) -> &Token {
        &self.token
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_words_are_whole_lowercase_tokens() {
        assert_eq!(tokenize("Hello World123"), vec!["hello", "world123"]);
    }

    #[test]
    fn test_cjk_emits_bigrams_and_single_chars() {
        assert_eq!(tokenize("日記"), vec!["日", "日記", "記"]);
    }

    #[test]
    fn test_single_cjk_char_is_findable() {
        assert_eq!(tokenize("桜"), vec!["桜"]);
    }

    #[test]
    fn test_mixed_script() {
        assert_eq!(
            tokenize("Rust日記2025"),
            vec!["rust", "日", "日記", "記", "2025"]
        );
    }

    #[test]
    fn test_punctuation_and_whitespace_break_runs() {
        assert_eq!(tokenize("a-b c。d"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_stream_offsets_cover_source_bytes() {
        let mut tokenizer = GardenTokenizer;
        let text = "ab 日記";
        let mut stream = tokenizer.token_stream(text);
        let mut seen = Vec::new();
        while stream.advance() {
            let t = stream.token();
            seen.push((t.text.clone(), t.offset_from, t.offset_to));
        }
        assert_eq!(seen[0], ("ab".to_string(), 0, 2));
        assert_eq!(seen[1], ("日".to_string(), 3, 6));
        assert_eq!(seen[2], ("日記".to_string(), 3, 9));
        assert_eq!(seen[3], ("記".to_string(), 6, 9));
    }
}
