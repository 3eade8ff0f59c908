pub mod domain;
pub mod flow;
pub mod links;
pub mod ports;
pub mod reveal;

pub use domain::{Answer, DeliveryStatus, LetterContent, LetterRecord, PartialLetter};
pub use flow::{
    ComposerEffect, ComposerEvent, ComposerFlow, ComposerStep, StatusEffect, StatusEvent,
    StatusFlow, StatusStep, ViewerEffect, ViewerEvent, ViewerFlow, ViewerStep,
};
pub use ports::{LetterStore, SealTicket, StoreError, StoreResult};
pub use reveal::RevealAnimator;
