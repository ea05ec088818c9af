pub(crate) mod gateway;
pub(crate) mod history;
pub(crate) mod service;
