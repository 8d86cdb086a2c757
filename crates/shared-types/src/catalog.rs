//! # Event Catalog
//!
//! The `Events` contract: a closed mapping from topic name to the tuple
//! shape of its arguments, plus the static priority table.
//!
//! Catalogs are normally declared with [`event_catalog!`](crate::event_catalog):
//!
//! ```rust
//! shared_types::event_catalog! {
//!     /// Topics of the example catalog.
//!     pub enum ExampleTopic;
//!
//!     /// Events of the example catalog.
//!     pub enum ExampleEvent {
//!         /// Opening handshake.
//!         Handshake() => "handshake" @Critical,
//!         /// Free-form log line.
//!         Log(line: String) => "log",
//!         /// Pointer moved.
//!         PointerMoved(x: i32, y: i32) => "pointerMoved" @Background,
//!         /// Emitted locally when the port closes.
//!         PortClosed() => "portClosed" @Critical,
//!     }
//!
//!     disconnected => PortClosed;
//! }
//! ```
//!
//! Argument types must implement `Serialize`, `DeserializeOwned`, `Debug`,
//! `Clone` and `PartialEq`.

use serde_json::Value;
use std::fmt;
use std::hash::Hash;

use crate::{CatalogError, PriorityClass, WireMessage};

/// A topic of a closed catalog.
pub trait Topic: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Every topic of the catalog, in declaration order.
    const ALL: &'static [Self];

    /// Name used on the wire.
    fn name(self) -> &'static str;

    /// Number of positional arguments the topic carries.
    fn arity(self) -> usize;

    /// Explicit entry in the static priority table, if any.
    fn priority(self) -> Option<PriorityClass>;

    /// Effective priority class: the table entry or [`PriorityClass::DEFAULT`].
    fn class(self) -> PriorityClass {
        self.priority().unwrap_or(PriorityClass::DEFAULT)
    }

    /// Resolve a wire name back to a topic.
    fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|topic| topic.name() == name)
    }
}

/// A typed event: one topic plus its arguments.
pub trait Events: Sized + fmt::Debug + Send + 'static {
    /// Topic enumeration of this catalog.
    type Topic: Topic;

    /// Topic of this event.
    fn topic(&self) -> Self::Topic;

    /// Positional arguments as JSON values.
    fn to_args(&self) -> Result<Vec<Value>, CatalogError>;

    /// Rebuild an event from its topic and positional arguments.
    fn from_args(topic: Self::Topic, args: Vec<Value>) -> Result<Self, CatalogError>;

    /// Event emitted locally by a port adapter when its port disconnects.
    fn disconnected_event() -> Option<Self> {
        None
    }

    /// Wire name of this event's topic.
    fn name(&self) -> &'static str {
        self.topic().name()
    }

    /// Priority class of this event's topic.
    fn class(&self) -> PriorityClass {
        self.topic().class()
    }

    /// Decode a string-keyed `(topic, args)` pair.
    fn decode(topic: &str, args: Vec<Value>) -> Result<Self, CatalogError> {
        let topic = Self::Topic::parse(topic)
            .ok_or_else(|| CatalogError::UnknownTopic(topic.to_string()))?;
        Self::from_args(topic, args)
    }

    /// Encode into a wire message.
    fn to_wire(&self) -> Result<WireMessage, CatalogError> {
        Ok(WireMessage::new(self.name(), self.to_args()?))
    }

    /// Decode a wire message, checking the catalog version first.
    fn from_wire(message: WireMessage) -> Result<Self, CatalogError> {
        message.check_version()?;
        Self::decode(&message.topic, message.args)
    }
}

/// Declare a closed event catalog.
///
/// Generates a `Copy` topic enum implementing [`Topic`] and an event enum
/// implementing [`Events`]. Each entry reads
/// `Variant(field: Type, ...) => "wireName" @Class`; the `@Class` suffix is
/// optional and unmapped topics fall into [`PriorityClass::DEFAULT`]. The
/// trailing `disconnected => Variant;` line names a zero-argument event that
/// port adapters emit locally when the port closes.
#[macro_export]
macro_rules! event_catalog {
    (
        $(#[$topic_meta:meta])*
        $topic_vis:vis enum $Topic:ident;

        $(#[$event_meta:meta])*
        $event_vis:vis enum $Event:ident {
            $(
                $(#[$variant_meta:meta])*
                $Variant:ident ( $($field:ident : $ty:ty),* $(,)? ) => $name:literal $(@ $class:ident)?
            ),* $(,)?
        }

        $(disconnected => $Closed:ident;)?
    ) => {
        $(#[$topic_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $topic_vis enum $Topic {
            $(
                $(#[$variant_meta])*
                $Variant,
            )*
        }

        impl $crate::Topic for $Topic {
            const ALL: &'static [Self] = &[$(Self::$Variant),*];

            fn name(self) -> &'static str {
                match self {
                    $(Self::$Variant => $name,)*
                }
            }

            fn arity(self) -> usize {
                match self {
                    $(Self::$Variant => 0usize $(+ $crate::__catalog_one!($field))*,)*
                }
            }

            fn priority(self) -> ::core::option::Option<$crate::PriorityClass> {
                match self {
                    $(Self::$Variant => $crate::__catalog_priority!($($class)?),)*
                }
            }
        }

        impl ::core::fmt::Display for $Topic {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str($crate::Topic::name(*self))
            }
        }

        $(#[$event_meta])*
        #[derive(Debug, Clone, PartialEq)]
        $event_vis enum $Event {
            $(
                $(#[$variant_meta])*
                $Variant($($ty),*),
            )*
        }

        impl $crate::Events for $Event {
            type Topic = $Topic;

            fn topic(&self) -> $Topic {
                match self {
                    $(Self::$Variant(..) => $Topic::$Variant,)*
                }
            }

            fn to_args(
                &self,
            ) -> ::core::result::Result<
                ::std::vec::Vec<$crate::__private::serde_json::Value>,
                $crate::CatalogError,
            > {
                match self {
                    $(Self::$Variant($($field),*) => {
                        $crate::wire::encode_args($name, &($($field,)*))
                    })*
                }
            }

            fn from_args(
                topic: $Topic,
                args: ::std::vec::Vec<$crate::__private::serde_json::Value>,
            ) -> ::core::result::Result<Self, $crate::CatalogError> {
                match topic {
                    $($Topic::$Variant => {
                        let ($($field,)*): ($($ty,)*) = $crate::wire::decode_args(
                            $name,
                            $crate::Topic::arity(topic),
                            args,
                        )?;
                        Ok(Self::$Variant($($field),*))
                    })*
                }
            }

            fn disconnected_event() -> ::core::option::Option<Self> {
                $crate::__catalog_disconnected!($($Closed)?)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __catalog_one {
    ($field:ident) => {
        1usize
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __catalog_priority {
    () => {
        ::core::option::Option::None
    };
    ($class:ident) => {
        ::core::option::Option::Some($crate::PriorityClass::$class)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __catalog_disconnected {
    () => {
        ::core::option::Option::None
    };
    ($closed:ident) => {
        ::core::option::Option::Some(Self::$closed())
    };
}
