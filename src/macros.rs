/// Declares a message-carrying error type that can be raised with `bail!` and
/// recovered from an `anyhow::Error` with `downcast_ref`.
#[macro_export]
macro_rules! message_error {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name {
            pub message: String,
        }

        impl $name {
            pub fn new(message: impl Into<String>) -> Self {
                $name {
                    message: message.into(),
                }
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.message)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.message)
            }
        }

        impl std::error::Error for $name {}
    };
}

#[macro_export]
macro_rules! record {
    ($e1:expr,$e2:expr) => {{
        use bio::io::fasta::Record;
        Record::with_attrs($e1, None, $e2)
    }};
}

/// Builds an [`Alignment`](crate::alignment::Alignment) from `(id, sequence)` pairs.
#[macro_export]
macro_rules! alignment {
    ($(($id:expr, $seq:expr)),+ $(,)?) => {{
        $crate::alignment::Alignment::from_records(vec![$($crate::record!($id, $seq)),+]).unwrap()
    }};
}
