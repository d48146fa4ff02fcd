use interprocess::local_socket::{
    GenericNamespaced,
    ToNsName,
    traits::tokio::Stream as _,
    tokio::Stream,
};

/// The socket address id, opaque to this crate, derived into a namespaced socket name.
pub fn battle_socket_name(addr: &str) -> String {
    format!("psai-battle-socket-{addr}")
}

pub fn agent_socket_name(addr: &str) -> String {
    format!("psai-agent-socket-{addr}")
}

/// Connects to a named local-domain duplex socket.
///
/// A TCP fallback for non-local deployments is a distinct `Stream` type behind the same
/// `AsyncRead + AsyncWrite` bound everything else in this crate depends on; nothing above this
/// function needs to change to support it.
pub async fn connect_local(name: &str) -> std::io::Result<Stream> {
    let ns_name = name
        .to_ns_name::<GenericNamespaced>()
        .map_err(std::io::Error::other)?;
    Stream::connect(ns_name).await
}

#[cfg(test)]
mod socket_naming_test {
    use super::{
        agent_socket_name,
        battle_socket_name,
    };

    #[test]
    fn names_follow_the_templated_convention() {
        assert_eq!(battle_socket_name("worker-1"), "psai-battle-socket-worker-1");
        assert_eq!(agent_socket_name("worker-1"), "psai-agent-socket-worker-1");
    }
}
