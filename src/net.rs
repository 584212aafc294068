use crate::zone::{Nameserver, Zone};
use log::{trace, warn};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::io::ErrorKind::ConnectionRefused;
use std::net::{Ipv4Addr, SocketAddr};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::{io::ReadBuf, net::UdpSocket};

/// Opens a non-blocking UDP socket connected to `addr`
///
/// Being connected, the socket only ever sees datagrams sent from `addr`.
fn connect(addr: SocketAddr) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_nonblocking(true)?;

    let any: SockAddr = SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0).into();
    socket.bind(&any)?;
    socket.connect(&addr.into())?;

    UdpSocket::from_std(socket.into())
}

/// A datagram received from one of the queried nameservers
#[derive(Debug)]
pub struct Response {
    pub from: Nameserver,
    pub data: Vec<u8>,
}

/// The outstanding query to every nameserver of a zone
///
/// Dropping the exchange closes all of its sockets.
pub struct Exchange {
    sockets: Vec<(Nameserver, UdpSocket)>,
}

impl Exchange {
    /// Sends `packet` to every nameserver in `zone`, one socket each
    ///
    /// Must be called from within a runtime.
    pub async fn dispatch(zone: &Zone, port: u16, packet: &[u8]) -> io::Result<Exchange> {
        let mut sockets = Vec::with_capacity(zone.len());
        for nameserver in zone {
            let addr = SocketAddr::new(nameserver.addr.into(), port);
            let socket = connect(addr)?;

            trace!("sending packet to {} at {}", nameserver, addr);
            let sent = socket.send(packet).await?;
            if sent != packet.len() {
                warn!("failed to send entire packet to {}", nameserver);
            }
            sockets.push((nameserver.clone(), socket));
        }

        Ok(Exchange { sockets })
    }

    /// Nameservers still waited on
    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }

    /// Waits until at least one socket is readable
    ///
    /// Resolves to every datagram that is ready at that point, across all
    /// sockets. Never resolves if nobody answers, so callers bound it with
    /// a timeout.
    pub fn recv_ready(&mut self) -> RecvReady<'_> {
        RecvReady { exchange: self }
    }
}

pub struct RecvReady<'a> {
    exchange: &'a mut Exchange,
}

impl<'a> Future for RecvReady<'a> {
    type Output = io::Result<Vec<Response>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        let sockets = &mut Pin::get_mut(self).exchange.sockets;

        let mut recv_buf = [0u8; 65536];
        let mut ready = Vec::new();
        let mut refused = Vec::new();
        for (idx, (nameserver, socket)) in sockets.iter().enumerate() {
            loop {
                let mut buf = ReadBuf::new(&mut recv_buf);
                match socket.poll_recv(cx, &mut buf) {
                    Poll::Ready(Ok(())) => {
                        trace!("received packet from {}", nameserver);
                        ready.push(Response {
                            from: nameserver.clone(),
                            data: buf.filled().to_vec(),
                        });
                    }
                    // ICMP port unreachable, nothing will come from there
                    Poll::Ready(Err(ref err)) if err.kind() == ConnectionRefused => {
                        warn!("{} refused the query", nameserver);
                        refused.push(idx);
                        break;
                    }
                    Poll::Ready(Err(err)) => return Poll::Ready(Err(err)),
                    Poll::Pending => break,
                }
            }
        }

        for idx in refused.into_iter().rev() {
            sockets.remove(idx);
        }

        if ready.is_empty() {
            Poll::Pending
        } else {
            Poll::Ready(Ok(ready))
        }
    }
}
