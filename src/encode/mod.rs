mod writer;

pub(crate) use writer::ValueWriter;
