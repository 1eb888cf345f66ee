pub mod commands;
pub mod completion;
pub mod evaluation;
pub mod formatting;
pub mod hover;
pub mod words;

#[cfg(test)]
pub(crate) mod test_support;
