//! Per-guild staff access rules backed by a JSON file.
//!
//! Each guild carries a map of staff command name to the role ids allowed to
//! run it, plus a user allow-list for the admin panel. Guild administrators
//! (Administrator or Manage Guild) bypass both lists. The whole file is
//! rewritten on every mutation; the store is small and edits are rare.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};
use serenity::all::Permissions;

use crate::error::AppError;

/// Staff commands whose access can be scoped to roles.
pub const STAFF_COMMANDS: [&str; 3] = ["eventpanel", "controlevent", "panelsettings"];

/// Access rules for one guild.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GuildAccess {
    /// Command name -> role ids allowed to run it. An absent or empty list
    /// means admins only.
    #[serde(default)]
    pub commands: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub panel_access: PanelAccess,
}

/// Admin-panel allow-list for one guild.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PanelAccess {
    #[serde(default)]
    pub users_allow: Vec<String>,
}

/// File-backed store of per-guild staff access rules.
pub struct StaffAccessStore {
    path: PathBuf,
    guilds: Mutex<HashMap<String, GuildAccess>>,
}

impl StaffAccessStore {
    /// Loads the store from `path`. A missing file starts the store empty;
    /// it is created on the first save.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();

        let guilds = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(AppError::IoErr(err)),
        };

        Ok(Self {
            path,
            guilds: Mutex::new(guilds),
        })
    }

    fn guilds_lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, GuildAccess>> {
        self.guilds.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn save_locked(&self, guilds: &HashMap<String, GuildAccess>) -> Result<(), AppError> {
        let raw = serde_json::to_string_pretty(guilds)?;
        std::fs::write(&self.path, raw).map_err(AppError::IoErr)?;
        Ok(())
    }

    /// Role ids allowed to run `command` in the guild.
    pub fn roles_for_command(&self, guild_id: &str, command: &str) -> Vec<String> {
        self.guilds_lock()
            .get(guild_id)
            .and_then(|g| g.commands.get(command))
            .cloned()
            .unwrap_or_default()
    }

    /// Adds a role to a command's allow-list. Returns false when the role was
    /// already listed.
    pub fn add_role_to_command(
        &self,
        guild_id: &str,
        command: &str,
        role_id: &str,
    ) -> Result<bool, AppError> {
        let mut guilds = self.guilds_lock();
        let guild = guilds.entry(guild_id.to_string()).or_default();
        let roles = guild.commands.entry(command.to_string()).or_default();

        if roles.iter().any(|r| r == role_id) {
            return Ok(false);
        }
        roles.push(role_id.to_string());

        self.save_locked(&guilds)?;
        Ok(true)
    }

    /// Removes a role from a command's allow-list. Returns false when the
    /// role was not listed.
    pub fn remove_role_from_command(
        &self,
        guild_id: &str,
        command: &str,
        role_id: &str,
    ) -> Result<bool, AppError> {
        let mut guilds = self.guilds_lock();
        let Some(roles) = guilds
            .get_mut(guild_id)
            .and_then(|g| g.commands.get_mut(command))
        else {
            return Ok(false);
        };

        let before = roles.len();
        roles.retain(|r| r != role_id);
        if roles.len() == before {
            return Ok(false);
        }

        self.save_locked(&guilds)?;
        Ok(true)
    }

    /// Users explicitly allowed into the admin panel.
    pub fn panel_allow_users(&self, guild_id: &str) -> Vec<String> {
        self.guilds_lock()
            .get(guild_id)
            .map(|g| g.panel_access.users_allow.clone())
            .unwrap_or_default()
    }

    pub fn add_panel_user(&self, guild_id: &str, user_id: &str) -> Result<bool, AppError> {
        let mut guilds = self.guilds_lock();
        let guild = guilds.entry(guild_id.to_string()).or_default();

        if guild.panel_access.users_allow.iter().any(|u| u == user_id) {
            return Ok(false);
        }
        guild.panel_access.users_allow.push(user_id.to_string());

        self.save_locked(&guilds)?;
        Ok(true)
    }

    pub fn remove_panel_user(&self, guild_id: &str, user_id: &str) -> Result<bool, AppError> {
        let mut guilds = self.guilds_lock();
        let Some(guild) = guilds.get_mut(guild_id) else {
            return Ok(false);
        };

        let before = guild.panel_access.users_allow.len();
        guild.panel_access.users_allow.retain(|u| u != user_id);
        if guild.panel_access.users_allow.len() == before {
            return Ok(false);
        }

        self.save_locked(&guilds)?;
        Ok(true)
    }

    /// Whether a member may run a staff command: guild admins always, others
    /// when they hold one of the command's allowed roles.
    pub fn can_run_staff_command(
        &self,
        guild_id: &str,
        command: &str,
        permissions: Permissions,
        member_roles: &[String],
    ) -> bool {
        if is_admin(permissions) {
            return true;
        }
        let allowed = self.roles_for_command(guild_id, command);
        member_roles.iter().any(|r| allowed.contains(r))
    }

    /// Whether a member may open and use the admin panel: guild admins or
    /// explicitly allow-listed users.
    pub fn can_access_admin_panel(
        &self,
        guild_id: &str,
        user_id: &str,
        permissions: Permissions,
    ) -> bool {
        if is_admin(permissions) {
            return true;
        }
        self.guilds_lock()
            .get(guild_id)
            .is_some_and(|g| g.panel_access.users_allow.iter().any(|u| u == user_id))
    }
}

/// Administrator or Manage Guild counts as admin everywhere in the bot.
pub fn is_admin(permissions: Permissions) -> bool {
    permissions.administrator() || permissions.manage_guild()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (StaffAccessStore, PathBuf) {
        let path = std::env::temp_dir().join(format!(
            "staff_access_test_{}_{}.json",
            std::process::id(),
            rand::random::<u32>()
        ));
        let store = StaffAccessStore::load(&path).unwrap();
        (store, path)
    }

    #[test]
    fn missing_file_starts_empty() {
        let (store, path) = temp_store();
        assert!(store.roles_for_command("g1", "eventpanel").is_empty());
        assert!(store.panel_allow_users("g1").is_empty());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn role_add_remove_round_trip_persists() {
        let (store, path) = temp_store();

        assert!(store.add_role_to_command("g1", "eventpanel", "r1").unwrap());
        // Re-adding is a no-op.
        assert!(!store.add_role_to_command("g1", "eventpanel", "r1").unwrap());

        // A fresh store sees the saved file.
        let reloaded = StaffAccessStore::load(&path).unwrap();
        assert_eq!(
            reloaded.roles_for_command("g1", "eventpanel"),
            vec!["r1".to_string()]
        );

        assert!(store
            .remove_role_from_command("g1", "eventpanel", "r1")
            .unwrap());
        assert!(!store
            .remove_role_from_command("g1", "eventpanel", "r1")
            .unwrap());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn saved_file_uses_camel_case_keys() {
        let (store, path) = temp_store();
        store.add_panel_user("g1", "u1").unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"panelAccess\""));
        assert!(raw.contains("\"usersAllow\""));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn admin_bypasses_role_lists() {
        let (store, path) = temp_store();

        assert!(store.can_run_staff_command(
            "g1",
            "eventpanel",
            Permissions::ADMINISTRATOR,
            &[]
        ));
        assert!(store.can_run_staff_command(
            "g1",
            "eventpanel",
            Permissions::MANAGE_GUILD,
            &[]
        ));
        assert!(!store.can_run_staff_command("g1", "eventpanel", Permissions::empty(), &[]));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn role_holder_can_run_configured_command() {
        let (store, path) = temp_store();
        store.add_role_to_command("g1", "controlevent", "r9").unwrap();

        assert!(store.can_run_staff_command(
            "g1",
            "controlevent",
            Permissions::empty(),
            &["r9".to_string()]
        ));
        // The grant is scoped to the command it was made for.
        assert!(!store.can_run_staff_command(
            "g1",
            "eventpanel",
            Permissions::empty(),
            &["r9".to_string()]
        ));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn panel_access_requires_allow_list_or_admin() {
        let (store, path) = temp_store();

        assert!(!store.can_access_admin_panel("g1", "u1", Permissions::empty()));
        store.add_panel_user("g1", "u1").unwrap();
        assert!(store.can_access_admin_panel("g1", "u1", Permissions::empty()));

        store.remove_panel_user("g1", "u1").unwrap();
        assert!(!store.can_access_admin_panel("g1", "u1", Permissions::empty()));
        assert!(store.can_access_admin_panel("g1", "u1", Permissions::ADMINISTRATOR));

        let _ = std::fs::remove_file(path);
    }
}
