//! Lexer module producing minimal tokens for directive scanning

mod scanner;
mod token;

pub use scanner::{Lexer, spelling};
pub use token::{Punct, Token, TokenKind};

pub(crate) use scanner::splice_len;
