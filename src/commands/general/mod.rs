pub(crate) mod ping;
pub(crate) mod poll;
