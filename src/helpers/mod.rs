//! Low-level helpers shared by the workbook reader and the document package
pub(crate) mod opc;
pub(crate) mod reader;
pub(crate) mod xml;
pub(crate) mod zip;
