use super::models::{
    BackendInterface, BackendLink, BackendSubnet, BackendVlan, LinkContext,
    NetworkInterfaceContext,
};
use super::registry::TypedMapper;
use crate::error::{GatewayError, Result};

/// Machine network interfaces
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkMapper;

impl TypedMapper for NetworkMapper {
    const NAME: &'static str = "network";
    const BACKEND_IDENTITY: &'static [&'static str] = &["id", "name"];
    const CONTEXT_IDENTITY: &'static [&'static str] = &["id", "name"];

    type Backend = BackendInterface;
    type Context = NetworkInterfaceContext;

    fn to_context(&self, backend: BackendInterface) -> Result<NetworkInterfaceContext> {
        let (vlan_id, vlan_name, fabric) = match backend.vlan {
            Some(vlan) => (Some(vlan.vid), vlan.name, vlan.fabric),
            None => (None, None, None),
        };
        Ok(NetworkInterfaceContext {
            id: backend.id,
            name: backend.name,
            interface_type: backend.interface_type,
            mac_address: backend.mac_address.map(|mac| mac.to_ascii_lowercase()),
            enabled: backend.enabled,
            vlan_id,
            vlan_name,
            fabric,
            links: backend
                .links
                .into_iter()
                .map(|link| LinkContext {
                    mode: link.mode,
                    subnet_cidr: link.subnet.map(|s| s.cidr),
                    ip_address: link.ip_address,
                })
                .collect(),
        })
    }

    fn to_backend(&self, context: NetworkInterfaceContext) -> Result<BackendInterface> {
        let vlan = match (context.vlan_id, context.vlan_name, context.fabric) {
            (Some(vid), name, fabric) => Some(BackendVlan { vid, name, fabric }),
            (None, None, None) => None,
            (None, _, _) => {
                return Err(GatewayError::mapping(
                    Self::NAME,
                    format!("interface '{}' has VLAN details without a VLAN id", context.name),
                ))
            }
        };
        Ok(BackendInterface {
            id: context.id,
            name: context.name,
            interface_type: context.interface_type,
            mac_address: context.mac_address,
            enabled: context.enabled,
            vlan,
            links: context
                .links
                .into_iter()
                .map(|link| BackendLink {
                    mode: link.mode,
                    subnet: link.subnet_cidr.map(|cidr| BackendSubnet { cidr }),
                    ip_address: link.ip_address,
                })
                .collect(),
        })
    }
}
