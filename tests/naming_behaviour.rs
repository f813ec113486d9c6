//! Behavioural scenarios for batch membership markers.

mod naming;
