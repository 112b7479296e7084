pub mod inline_classification_dispatcher;
pub mod threaded_classification_dispatcher;
