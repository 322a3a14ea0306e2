//! Push channel lifecycle (`WS /notifications/{clientId}`).
//!
//! The transport adapter calls [`open`] once the socket is accepted, keeps
//! reading inbound frames, and calls [`close`] when the client goes away.

use crate::app::CourierService;
use crate::domain::ClientId;
use crate::ports::PushChannel;
use crate::registry::Connection;

pub async fn open(
    service: &CourierService,
    client_id: ClientId,
    channel: Box<dyn PushChannel>,
) -> Connection {
    service.registry().connect(client_id, channel).await
}

pub async fn close(service: &CourierService, connection: &Connection) {
    service.registry().disconnect(connection).await;
}
