pub use crate::error::Error;

pub mod phase0 {
    pub use block_processing::{
        process_block, process_block_header, process_deposit, process_deposits,
    };
    pub use epoch_processing::{
        process_ejections, process_epoch, process_final_updates,
        process_justification_and_finalization,
    };
    pub use slot_processing::{process_slot, process_slots};
    pub use state_transition::{state_transition, StateRootPolicy};

    mod block_processing;
    mod epoch_processing;
    mod slot_processing;
    mod state_transition;
}

mod error;
