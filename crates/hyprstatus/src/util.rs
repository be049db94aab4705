#[macro_export]
macro_rules! print_result_err {
    ($context:expr, $result:expr $(,)?) => {{
        if let Err(err) = $result {
            log::error!("[{}:{}] Error {}: {:?}", ::std::file!(), ::std::line!(), $context, err);
        }
    }};
}

/// Select in a loop, breaking once the given exit receiver fires (see `crate::application_lifecycle`).
#[macro_export]
macro_rules! loop_select_exiting {
    ($exit:expr, $($content:tt)*) => {
        loop {
            tokio::select! {
                _ = $crate::application_lifecycle::recv_exit($exit) => {
                    break;
                }
                $($content)*
            }
        }
    };
}
