#[cfg(test)]
pub(crate) mod test_logs;
