pub mod resubscribe;
