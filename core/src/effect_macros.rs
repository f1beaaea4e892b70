//! Declarative macros for effect construction

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use eventhub_core::async_effect;
///
/// async_effect! {
///     let image = encode_ticket(encoder.as_ref(), &payload, &options).await;
///     Some(TicketIssuerAction::ImageEncoded { session_id, request, image })
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}
