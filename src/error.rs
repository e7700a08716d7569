pub trait ResultOkLogExt<T, E> {
    fn ok_log(self, context: &str) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn ok_log(self, context: &str) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::error!("{context}: {err}");
                None
            }
        }
    }
}
