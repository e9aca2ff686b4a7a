use std::fmt;
use std::sync::Arc;

use http::Request;

use crate::writer::ResponseWriter;

/// Something that answers a request by writing into a [`ResponseWriter`].
pub trait Handler<B> {
    /// Handles `req`, writing the response into `writer`.
    fn serve(&self, writer: &mut dyn ResponseWriter, req: &Request<B>);
}

impl<B, H> Handler<B> for &H
where
    H: Handler<B> + ?Sized,
{
    fn serve(&self, writer: &mut dyn ResponseWriter, req: &Request<B>) {
        (**self).serve(writer, req)
    }
}

impl<B, H> Handler<B> for Arc<H>
where
    H: Handler<B> + ?Sized,
{
    fn serve(&self, writer: &mut dyn ResponseWriter, req: &Request<B>) {
        (**self).serve(writer, req)
    }
}

impl<B, H> Handler<B> for Box<H>
where
    H: Handler<B> + ?Sized,
{
    fn serve(&self, writer: &mut dyn ResponseWriter, req: &Request<B>) {
        (**self).serve(writer, req)
    }
}

/// Returns a [`Handler`] that calls `f`.
pub fn handler_fn<F, B>(f: F) -> HandlerFn<F>
where
    F: Fn(&mut dyn ResponseWriter, &Request<B>),
{
    HandlerFn { f }
}

/// A [`Handler`] built from a closure. See [`handler_fn`].
#[derive(Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn")
            .field("f", &std::any::type_name::<F>())
            .finish()
    }
}

impl<F, B> Handler<B> for HandlerFn<F>
where
    F: Fn(&mut dyn ResponseWriter, &Request<B>),
{
    fn serve(&self, writer: &mut dyn ResponseWriter, req: &Request<B>) {
        (self.f)(writer, req)
    }
}
