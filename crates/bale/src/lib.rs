//! Bale Messenger nodes for baleflow.
//!
//! Implements an action node that calls the Bale Bot API (send text/media,
//! edit/delete messages, chat actions) and a trigger node that receives
//! updates through a webhook. Bale speaks the Telegram Bot API dialect from
//! `https://tapi.bale.ai`.

pub mod api;
pub mod credentials;
pub mod error;
pub mod markup;
pub mod node;
pub mod operation;
pub mod trigger;

#[cfg(test)]
mod test_support;

pub use {
    api::BaleClient,
    credentials::BaleApiCredentials,
    error::{Error, Result},
    markup::{MarkupMode, ReplyMarkup, build_reply_markup},
    node::BaleMessengerNode,
    trigger::BaleMessengerTrigger,
};
