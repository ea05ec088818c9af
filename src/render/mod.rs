pub(crate) mod canvas;
pub(crate) mod constellation;
pub(crate) mod cpu;
pub(crate) mod effects;
pub(crate) mod surprise;
pub(crate) mod text;
pub(crate) mod words;
