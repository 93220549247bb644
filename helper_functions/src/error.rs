use parse_display::Display;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("committee index is out of bounds")]
    CommitteeIndexOutOfBounds,
    #[error(
        "aggregation bitfield length {aggregation_bitfield_length} \
         does not match committee length {committee_length}"
    )]
    CommitteeLengthMismatch {
        aggregation_bitfield_length: usize,
        committee_length: usize,
    },
    #[error("failed to select proposer")]
    FailedToSelectProposer,
    #[error("no validators are active")]
    NoActiveValidators,
    #[error("{0} is invalid")]
    SignatureInvalid(SignatureKind),
    #[error("slot is out of range")]
    SlotOutOfRange,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum SignatureKind {
    #[display("block signature")]
    Block,
    #[display("deposit proof of possession")]
    Deposit,
    #[display("collection of multiple signatures")]
    Multi,
}
