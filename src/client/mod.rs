//! Cliente REST de reservas
//! 
//! Cliente tipado para la API de reservas y el contexto de sesión explícito
//! que lo acompaña. Implementa `RentalBackend`, así que los flujos de
//! entrega y devolución pueden trabajar contra un backend remoto.

pub mod booking_client;
pub mod session;

pub use booking_client::{map_error_response, BookingApiClient};
pub use session::{Session, SessionContext};
