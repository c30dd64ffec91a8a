mod common;
mod stream;
