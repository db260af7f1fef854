//! Parsing Expression Grammar (PEG) parsing rules for a Decentralized Identifier and DID URL,
//! following the [DID Syntax](https://www.w3.org/TR/did-core/#did-syntax) ABNF

use crate::types::{Did, DidUrl};

pub use did_syntax_parser::did as parse_did;
pub use did_syntax_parser::did_url as parse_did_url;

peg::parser! {
    grammar did_syntax_parser() for str {
        rule method_char() = ['a'..='z' | '0'..='9']

        rule id_char() = ['a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_']

        rule hex_digit() = ['0'..='9' | 'a'..='f' | 'A'..='F']

        rule pct_encoded() = "%" hex_digit() hex_digit()

        rule unreserved() = ['a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '.' | '_' | '~']

        rule sub_delim() = ['!' | '$' | '&' | '\'' | '(' | ')' | '*' | '+' | ',' | ';' | '=']

        rule pchar() = unreserved() / pct_encoded() / sub_delim() / [':' | '@']

        rule method_name() -> &'input str
            = $(method_char()+) / expected!("a method name of lowercase letters and digits")

        // empty segments are allowed, but the id may not end on one
        rule method_specific_id() -> &'input str
            = id:$((id_char() / pct_encoded() / ":")+) {?
                if id.ends_with(':') {
                    Err("a method-specific-id without a trailing colon")
                } else {
                    Ok(id)
                }
            }

        rule id_segment() = (id_char() / pct_encoded())+

        rule url_method_specific_id() -> &'input str
            = $(id_segment() ++ ":")

        rule path_abempty() -> &'input str
            = $(("/" pchar()+)+)

        rule query() -> &'input str
            = "?" q:$((pchar() / ['/' | '?'])+) { q }

        rule fragment() -> &'input str
            = "#" f:$((pchar() / ['/' | '?'])+) { f }

        /// Parses a bare DID, `did:<method-name>:<method-specific-id>`
        ///
        /// # Example
        /// ```rust
        /// use lib_didresolver::types::parse_did;
        ///
        /// let did = parse_did("did:example:123abc:456").unwrap();
        /// assert_eq!(did.method(), "example");
        /// assert_eq!(did.method_id(), "123abc:456");
        /// ```
        pub rule did() -> Did
            = "did:" method:method_name() ":" id:method_specific_id() {
                Did::new_unchecked(method, id)
            }

        /// Parses a DID URL, a DID optionally followed by a path, a query and a fragment
        pub rule did_url() -> DidUrl
            = "did:" method:method_name() ":" id:url_method_specific_id()
              path:path_abempty()? query:query()? fragment:fragment()? {
                DidUrl {
                    did: Did::new_unchecked(method, id),
                    path: path.map(str::to_string),
                    query: query.map(str::to_string),
                    fragment: fragment.map(str::to_string),
                }
            }
    }
}
