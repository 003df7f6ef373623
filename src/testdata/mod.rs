pub(crate) mod responses;
