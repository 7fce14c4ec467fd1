pub mod query;
pub mod scalar;
pub mod schema;
pub mod selection;

#[cfg(test)]
mod test_util;
