pub(crate) mod meta;
pub(crate) mod migrate;
pub(crate) mod run;
pub(crate) mod status;
