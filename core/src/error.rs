//! Fatal, structural decode errors (spec.md Sec 7): short reads, misaligned
//! filter-node offsets, and out-of-range regex-table indices. Non-fatal
//! failures (unsupported regex version, illegal opcode, unknown filter ID,
//! unknown enum value) are handled inline by the callers that encounter
//! them and never reach this type -- matching the teacher's split between
//! `LoaderError`/`WorkspaceError` (fatal, `#[derive(Fail)]`) and the
//! per-analyzer warnings logged with `log::warn!`.

use failure::Fail;

use crate::cursor::CursorError;

#[derive(Debug, Fail)]
pub enum DecodeError {
    #[fail(display = "{}", _0)]
    ShortRead(#[cause] CursorError),

    #[fail(display = "regex-table index {} is out of range (table has {} entries)", idx, len)]
    RegexIndexOutOfRange { idx: u16, len: usize },
}

impl From<CursorError> for DecodeError {
    fn from(e: CursorError) -> DecodeError {
        DecodeError::ShortRead(e)
    }
}
