// src/messages.rs

//! Public messages shown to end users.
//!
//! These are constants, not configuration: cached results store the
//! error messages verbatim and [`crate::models::WebResult::from_cache_text`]
//! matches on them byte-for-byte, so changing one invalidates every
//! cached error result.

/// The public form refused to answer for a bank client.
pub const CLIENT_RESTRICTED: &str = "Eres cliente del banco?, no es posible consultar tu \
     informacion por la interfaz publica.";

/// The bank page asked to come back later.
pub const RETRY_LATER: &str = "La página del banco retornó con error y dice que intentes \
     nuevamente. Intenta nuevamente en unas horas.";

/// No payments registered for the queried RUT.
pub const NO_PAYMENTS: &str = "Actualmente no hay pagos a tu favor.";

/// The page shape was not recognized.
pub const PARSER_ERROR: &str = "No pude parsear la respuesta del banco :(. \
     Espero que pronto algún humano solucione esto.";

/// The request to the bank failed.
pub const CONNECTION_ERROR: &str = "Error de conexion, (probablemente) estamos trabajando \
     para solucionarlo.";

/// Catch-all for unexpected failures.
pub const INTERNAL_ERROR: &str = "¡Ups! Un error inesperado ha ocurrido, lo solucionaremos \
     a la brevedad (?)";

/// Subscription requires a stored RUT.
pub const SUBSCRIBE_NEEDS_RUT: &str = "Tienes que tener un rut registrado para poder subscribirte.";

/// Subscribing twice.
pub const ALREADY_SUBSCRIBED: &str = "Ya estás subscrito.";

/// Unsubscribing without a subscription.
pub const NOT_SUBSCRIBED: &str = "No estás subscrito.";

/// Input that looks like a RUT but is missing its check digit.
pub const LOOKS_LIKE_RUT: &str = "Esto parece ser un rut, para ingresar un rut por favor \
     incluye el digito verificador separado por un guión (-)";
