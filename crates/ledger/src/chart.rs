//! Account Registry: the per-organization chart of accounts.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use tillbooks_core::{AccountId, OrganizationId};

use crate::account::{Account, AccountType, NormalBalance};
use crate::error::{LedgerError, LedgerResult};

/// Chart of accounts for a single organization.
///
/// Accounts live in an arena keyed by id; the hierarchy is expressed
/// through parent ids and kept acyclic by walking ancestors before every
/// insert — runtime cycle detection is never the only safety net.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartOfAccounts {
    organization: OrganizationId,
    accounts: HashMap<AccountId, Account>,
    by_code: HashMap<String, AccountId>,
}

impl ChartOfAccounts {
    pub fn new(organization: OrganizationId) -> Self {
        Self {
            organization,
            accounts: HashMap::new(),
            by_code: HashMap::new(),
        }
    }

    pub fn organization(&self) -> OrganizationId {
        self.organization
    }

    /// Create a regular account.
    ///
    /// Fails with [`LedgerError::DuplicateCode`] when the code is taken,
    /// [`LedgerError::ForeignParent`] when the parent is not in this chart,
    /// [`LedgerError::HierarchyCycle`] when the parent chain is corrupt, and
    /// [`LedgerError::NormalBalanceMismatch`] when the declared side
    /// contradicts the account type.
    pub fn create_account(
        &mut self,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
        normal_balance: NormalBalance,
        parent: Option<AccountId>,
    ) -> LedgerResult<Account> {
        self.insert(code, name, account_type, normal_balance, parent, false)
    }

    /// Create an account carrying the system flag (protected from
    /// deactivation). Used for seeded accounts like the default cash and
    /// retained-earnings accounts.
    pub fn create_system_account(
        &mut self,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
        normal_balance: NormalBalance,
        parent: Option<AccountId>,
    ) -> LedgerResult<Account> {
        self.insert(code, name, account_type, normal_balance, parent, true)
    }

    fn insert(
        &mut self,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
        normal_balance: NormalBalance,
        parent: Option<AccountId>,
        system: bool,
    ) -> LedgerResult<Account> {
        let code = code.into();
        if self.by_code.contains_key(&code) {
            return Err(LedgerError::DuplicateCode { code });
        }
        if let Some(parent_id) = parent {
            if !self.accounts.contains_key(&parent_id) {
                return Err(LedgerError::ForeignParent { parent: parent_id });
            }
            self.ensure_acyclic(parent_id)?;
        }

        let account = Account::new(
            AccountId::new(),
            self.organization,
            code,
            name,
            account_type,
            normal_balance,
            parent,
            system,
        )?;
        self.by_code.insert(account.code.clone(), account.id);
        self.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    /// Walk the ancestor chain from `start`, rejecting revisits. A freshly
    /// minted id cannot introduce a cycle, so this guards against a chart
    /// that is already corrupt rather than against this insert.
    fn ensure_acyclic(&self, start: AccountId) -> LedgerResult<()> {
        let mut seen = HashSet::new();
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            if !seen.insert(id) {
                return Err(LedgerError::HierarchyCycle { parent: start });
            }
            cursor = self.accounts.get(&id).and_then(|a| a.parent);
        }
        Ok(())
    }

    /// Deactivate an account. Children keep their own active flags; there
    /// is no cascade.
    pub fn deactivate(&mut self, id: AccountId) -> LedgerResult<()> {
        let account = self
            .accounts
            .get_mut(&id)
            .ok_or(LedgerError::AccountNotFound { id })?;
        if account.system {
            return Err(LedgerError::SystemAccountProtected { account: id });
        }
        account.active = false;
        Ok(())
    }

    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    pub fn get_by_code(&self, code: &str) -> Option<&Account> {
        self.by_code.get(code).and_then(|id| self.accounts.get(id))
    }

    pub fn contains(&self, id: AccountId) -> bool {
        self.accounts.contains_key(&id)
    }

    /// All accounts, ordered by code.
    pub fn list(&self) -> Vec<&Account> {
        let mut all: Vec<&Account> = self.accounts.values().collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        all
    }

    /// Ancestor codes joined root-first with the account's own code.
    /// Display only — identity stays (organization, code).
    pub fn resolve_full_code(&self, id: AccountId) -> LedgerResult<String> {
        let account = self
            .accounts
            .get(&id)
            .ok_or(LedgerError::AccountNotFound { id })?;

        let mut codes = vec![account.code.as_str()];
        let mut seen = HashSet::from([id]);
        let mut cursor = account.parent;
        while let Some(parent_id) = cursor {
            if !seen.insert(parent_id) {
                return Err(LedgerError::HierarchyCycle { parent: parent_id });
            }
            let parent = self
                .accounts
                .get(&parent_id)
                .ok_or(LedgerError::AccountNotFound { id: parent_id })?;
            codes.push(parent.code.as_str());
            cursor = parent.parent;
        }
        codes.reverse();
        Ok(codes.join("-"))
    }
}
