//! In-memory store

use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{Local, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    Category, CategoryUpdate, Expense, ExpenseUpdate, InviteList, InviteStatus, NewCategory,
    NewExpense, PartnerInvite, PartnerStatus, UserProfile,
};
use crate::registry::{builtin_categories, CategoryRegistry, CategorySpec};

use super::{ExpenseQuery, ExpenseStore};

#[derive(Debug, Default)]
struct State {
    users: Vec<UserProfile>,
    /// Creation order
    expenses: Vec<Expense>,
    /// Global defaults first, then user categories in creation order
    categories: Vec<Category>,
    invites: Vec<PartnerInvite>,
}

impl State {
    fn user(&self, id: Uuid) -> Result<&UserProfile> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| Error::NotFound(format!("User {}", id)))
    }

    fn user_mut(&mut self, id: Uuid) -> Result<&mut UserProfile> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| Error::NotFound(format!("User {}", id)))
    }

    fn visible_to(category: &Category, user_id: Uuid) -> bool {
        category.owner.is_none() || category.owner == Some(user_id)
    }

    fn category_visible(&self, user_id: Uuid, name: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.name == name && Self::visible_to(c, user_id))
    }

    /// Keep a category name only if the user can see it; blank clears it
    fn normalize_category(&self, user_id: Uuid, name: Option<String>) -> Option<String> {
        let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())?;
        if self.category_visible(user_id, &name) {
            Some(name)
        } else {
            debug!(user_id = %user_id, category = %name, "Unknown category, storing as uncategorized");
            None
        }
    }

    fn household(&self, user_id: Uuid, include_partner: bool) -> Result<Vec<Uuid>> {
        let user = self.user(user_id)?;
        let mut ids = vec![user.id];
        if include_partner {
            ids.extend(user.partner_id);
        }
        Ok(ids)
    }

    fn sorted_expenses(&self, owners: &[Uuid]) -> Vec<Expense> {
        let mut expenses: Vec<Expense> = self
            .expenses
            .iter()
            .filter(|e| owners.contains(&e.user_id))
            .cloned()
            .collect();
        expenses.sort_by(|a, b| b.date.cmp(&a.date));
        expenses
    }
}

/// Thread-safe in-memory store
///
/// Clones share the same underlying data.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(&builtin_categories())
    }
}

impl MemoryStore {
    /// Empty store with the given global default categories
    pub fn new(defaults: &[CategorySpec]) -> Self {
        let categories = CategoryRegistry::from_specs(defaults)
            .categories()
            .to_vec();
        Self {
            state: Arc::new(RwLock::new(State {
                categories,
                ..State::default()
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    // ========== Users ==========

    pub fn create_user(&self, email: &str, name: Option<&str>) -> Result<UserProfile> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(Error::Validation(format!("Invalid email: {}", email)));
        }

        let mut state = self.write();
        if state.users.iter().any(|u| u.email == email) {
            return Err(Error::Conflict(format!("User {} already exists", email)));
        }

        let user = UserProfile {
            id: Uuid::new_v4(),
            email,
            name: name.map(str::to_string),
            partner_id: None,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        info!(user_id = %user.id, "Created user");
        Ok(user)
    }

    pub fn get_user(&self, id: Uuid) -> Result<UserProfile> {
        self.read().user(id).cloned()
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<UserProfile> {
        let email = email.trim().to_lowercase();
        self.read().users.iter().find(|u| u.email == email).cloned()
    }

    pub fn list_users(&self) -> Vec<UserProfile> {
        self.read().users.clone()
    }

    // ========== Expenses ==========

    /// Validate and store a new expense owned by `user_id`
    ///
    /// Category names the user cannot see are dropped (stored uncategorized).
    pub fn add_expense(&self, user_id: Uuid, new: NewExpense) -> Result<Expense> {
        new.validate()?;
        let mut state = self.write();
        state.user(user_id)?;

        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4(),
            user_id,
            amount: new.amount,
            description: new.description.trim().to_string(),
            category: state.normalize_category(user_id, new.category),
            merchant: new.merchant.filter(|m| !m.trim().is_empty()),
            date: new.date.unwrap_or_else(|| Local::now().date_naive()),
            source: new.source,
            email_id: new.email_id,
            created_at: now,
            updated_at: now,
        };
        state.expenses.push(expense.clone());
        debug!(expense_id = %expense.id, user_id = %user_id, amount = %expense.amount, "Added expense");
        Ok(expense)
    }

    pub fn get_expense(&self, user_id: Uuid, id: Uuid) -> Result<Expense> {
        self.read()
            .expenses
            .iter()
            .find(|e| e.id == id && e.user_id == user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Expense {}", id)))
    }

    /// Apply a partial update; only the owner may update
    pub fn update_expense(&self, user_id: Uuid, id: Uuid, update: ExpenseUpdate) -> Result<Expense> {
        update.validate()?;
        let mut state = self.write();

        let category = match update.category {
            Some(ref name) if name.trim().is_empty() => Some(None),
            Some(ref name) => state
                .normalize_category(user_id, Some(name.clone()))
                .map(Some),
            None => None,
        };

        let expense = state
            .expenses
            .iter_mut()
            .find(|e| e.id == id && e.user_id == user_id)
            .ok_or_else(|| Error::NotFound(format!("Expense {}", id)))?;

        if let Some(amount) = update.amount {
            expense.amount = amount;
        }
        if let Some(description) = update.description {
            expense.description = description.trim().to_string();
        }
        if let Some(category) = category {
            expense.category = category;
        }
        if let Some(merchant) = update.merchant {
            expense.merchant = Some(merchant).filter(|m| !m.trim().is_empty());
        }
        if let Some(date) = update.date {
            expense.date = date;
        }
        expense.updated_at = Utc::now();
        Ok(expense.clone())
    }

    /// Delete an expense; only the owner may delete
    pub fn delete_expense(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let mut state = self.write();
        let index = state
            .expenses
            .iter()
            .position(|e| e.id == id && e.user_id == user_id)
            .ok_or_else(|| Error::NotFound(format!("Expense {}", id)))?;
        state.expenses.remove(index);
        debug!(expense_id = %id, "Deleted expense");
        Ok(())
    }

    /// Filtered, paginated listing (newest first)
    pub fn list_expenses(&self, user_id: Uuid, query: &ExpenseQuery) -> Result<Vec<Expense>> {
        let state = self.read();
        let owners = state.household(user_id, query.include_partner)?;
        Ok(state
            .sorted_expenses(&owners)
            .into_iter()
            .filter(|e| query.matches(e))
            .skip(query.offset)
            .take(query.page_size())
            .collect())
    }

    /// Gmail message ids already imported by `user_id`
    pub fn imported_email_ids(&self, user_id: Uuid) -> HashSet<String> {
        self.read()
            .expenses
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter_map(|e| e.email_id.clone())
            .collect()
    }

    // ========== Categories ==========

    /// Defaults plus the user's own categories, ordered by name
    pub fn categories_for(&self, user_id: Uuid) -> Result<Vec<Category>> {
        let state = self.read();
        state.user(user_id)?;
        let mut categories: Vec<Category> = state
            .categories
            .iter()
            .filter(|c| State::visible_to(c, user_id))
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    pub fn create_category(&self, user_id: Uuid, new: NewCategory) -> Result<Category> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation("Category name is required".into()));
        }

        let mut state = self.write();
        state.user(user_id)?;
        if state.category_visible(user_id, &name) {
            return Err(Error::Conflict(format!(
                "Category with this name already exists: {}",
                name
            )));
        }

        let category = Category {
            id: Uuid::new_v4(),
            name,
            color: new.color,
            icon: new.icon,
            owner: Some(user_id),
        };
        state.categories.push(category.clone());
        info!(category = %category.name, user_id = %user_id, "Created category");
        Ok(category)
    }

    fn owned_category_index(state: &State, user_id: Uuid, id: Uuid) -> Result<usize> {
        let index = state
            .categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| Error::NotFound(format!("Category {}", id)))?;
        if state.categories[index].owner != Some(user_id) {
            return Err(Error::Forbidden("Cannot modify this category".into()));
        }
        Ok(index)
    }

    /// Update a user category; renaming carries the owner's expenses along
    pub fn update_category(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: CategoryUpdate,
    ) -> Result<Category> {
        let mut state = self.write();
        let index = Self::owned_category_index(&state, user_id, id)?;
        let old_name = state.categories[index].name.clone();

        if let Some(ref name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::Validation("Category name is required".into()));
            }
            if name != old_name && state.category_visible(user_id, name) {
                return Err(Error::Conflict(format!(
                    "Category with this name already exists: {}",
                    name
                )));
            }
        }

        let category = &mut state.categories[index];
        if let Some(name) = update.name {
            category.name = name.trim().to_string();
        }
        if let Some(color) = update.color {
            category.color = color;
        }
        if let Some(icon) = update.icon {
            category.icon = Some(icon);
        }
        let updated = category.clone();

        if updated.name != old_name {
            for expense in state
                .expenses
                .iter_mut()
                .filter(|e| e.user_id == user_id && e.category.as_deref() == Some(old_name.as_str()))
            {
                expense.category = Some(updated.name.clone());
            }
        }
        Ok(updated)
    }

    /// Delete a user category; the owner's expenses in it become uncategorized
    pub fn delete_category(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let mut state = self.write();
        let index = Self::owned_category_index(&state, user_id, id)?;
        let removed = state.categories.remove(index);

        let mut cleared = 0;
        for expense in state
            .expenses
            .iter_mut()
            .filter(|e| e.user_id == user_id && e.category.as_deref() == Some(removed.name.as_str()))
        {
            expense.category = None;
            cleared += 1;
        }
        info!(category = %removed.name, cleared, "Deleted category");
        Ok(())
    }

    // ========== Partners ==========

    /// Invite `email` to link accounts with `user_id`
    pub fn send_invite(&self, user_id: Uuid, email: &str) -> Result<PartnerInvite> {
        let email = email.trim().to_lowercase();
        let mut state = self.write();
        let user = state.user(user_id)?;

        if user.partner_id.is_some() {
            return Err(Error::Conflict("You already have a partner linked".into()));
        }
        if user.email == email {
            return Err(Error::Validation("You cannot invite yourself".into()));
        }
        if state.invites.iter().any(|i| {
            i.inviter_id == user_id && i.invitee_email == email && i.status == InviteStatus::Pending
        }) {
            return Err(Error::Conflict("Invite already sent to this email".into()));
        }

        let invite = PartnerInvite {
            id: Uuid::new_v4(),
            inviter_id: user_id,
            invitee_email: email,
            status: InviteStatus::Pending,
            created_at: Utc::now(),
        };
        state.invites.push(invite.clone());
        info!(invite_id = %invite.id, inviter = %user_id, "Partner invite sent");
        Ok(invite)
    }

    /// Pending invites sent by and addressed to `user_id`
    pub fn list_invites(&self, user_id: Uuid) -> Result<InviteList> {
        let state = self.read();
        let email = state.user(user_id)?.email.clone();
        let pending = state
            .invites
            .iter()
            .filter(|i| i.status == InviteStatus::Pending);

        let mut list = InviteList::default();
        for invite in pending {
            if invite.inviter_id == user_id {
                list.sent.push(invite.clone());
            } else if invite.invitee_email == email {
                list.received.push(invite.clone());
            }
        }
        Ok(list)
    }

    fn pending_invite_for(state: &State, user_id: Uuid, invite_id: Uuid) -> Result<usize> {
        let index = state
            .invites
            .iter()
            .position(|i| i.id == invite_id)
            .ok_or_else(|| Error::NotFound(format!("Invite {}", invite_id)))?;
        let invite = &state.invites[index];
        if state.user(user_id)?.email != invite.invitee_email {
            return Err(Error::Forbidden("This invite is addressed to someone else".into()));
        }
        if invite.status != InviteStatus::Pending {
            return Err(Error::Conflict("Invite is no longer pending".into()));
        }
        Ok(index)
    }

    /// Accept an invite addressed to `user_id`, linking both users.
    /// Returns the new partner.
    pub fn accept_invite(&self, user_id: Uuid, invite_id: Uuid) -> Result<UserProfile> {
        let mut state = self.write();
        let index = Self::pending_invite_for(&state, user_id, invite_id)?;
        let inviter_id = state.invites[index].inviter_id;

        if state.user(user_id)?.partner_id.is_some() {
            return Err(Error::Conflict("You already have a partner linked".into()));
        }
        if state.user(inviter_id)?.partner_id.is_some() {
            return Err(Error::Conflict("The inviter already has a partner linked".into()));
        }

        state.user_mut(user_id)?.partner_id = Some(inviter_id);
        let partner = {
            let inviter = state.user_mut(inviter_id)?;
            inviter.partner_id = Some(user_id);
            inviter.clone()
        };
        state.invites[index].status = InviteStatus::Accepted;
        info!(user_id = %user_id, partner_id = %inviter_id, "Partners linked");
        Ok(partner)
    }

    pub fn decline_invite(&self, user_id: Uuid, invite_id: Uuid) -> Result<()> {
        let mut state = self.write();
        let index = Self::pending_invite_for(&state, user_id, invite_id)?;
        state.invites[index].status = InviteStatus::Declined;
        info!(invite_id = %invite_id, "Partner invite declined");
        Ok(())
    }

    /// Remove the partner link on both sides; expenses are untouched
    pub fn unlink_partner(&self, user_id: Uuid) -> Result<()> {
        let mut state = self.write();
        let partner_id = state
            .user(user_id)?
            .partner_id
            .ok_or_else(|| Error::Validation("No partner to unlink".into()))?;

        state.user_mut(user_id)?.partner_id = None;
        if let Ok(partner) = state.user_mut(partner_id) {
            partner.partner_id = None;
        }
        info!(user_id = %user_id, partner_id = %partner_id, "Partners unlinked");
        Ok(())
    }

    pub fn partner_of(&self, user_id: Uuid) -> Result<Option<UserProfile>> {
        let state = self.read();
        match state.user(user_id)?.partner_id {
            Some(partner_id) => Ok(state.user(partner_id).ok().cloned()),
            None => Ok(None),
        }
    }

    pub fn partner_status(&self, user_id: Uuid) -> Result<PartnerStatus> {
        let partner = self.partner_of(user_id)?;
        Ok(PartnerStatus {
            has_partner: partner.is_some(),
            partner,
        })
    }

    /// Registry of the categories `user_id` can see, plus the partner's own
    /// categories when `include_partner` is set
    pub fn household_registry(&self, user_id: Uuid, include_partner: bool) -> Result<CategoryRegistry> {
        let guard = self.read();
        let state: &State = &guard;
        let owners = state.household(user_id, include_partner)?;
        Ok(CategoryRegistry::new(
            state
                .categories
                .iter()
                .filter(|c| c.owner.is_none())
                .chain(
                    owners
                        .iter()
                        .flat_map(|id| state.categories.iter().filter(move |c| c.owner == Some(*id))),
                )
                .cloned(),
        ))
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn expenses_for(&self, user_id: Uuid, include_partner: bool) -> Result<Vec<Expense>> {
        let state = self.read();
        let owners = state.household(user_id, include_partner)?;
        Ok(state.sorted_expenses(&owners))
    }

    async fn registry_for(&self, user_id: Uuid) -> Result<CategoryRegistry> {
        self.household_registry(user_id, true)
    }
}
