//! Vending machine control logic.
//!
//! The [`Machine`] owns every stock ledger, the selection cursor and the
//! current [`MachineState`]. Each public operation matches on the state and
//! runs that state's behaviour; a state never holds data of its own.
//! Operations validate everything before touching a ledger, so a rejected
//! call leaves the machine exactly as it was.

use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info};

use crate::Amount;
use crate::change;
use crate::ledger::Ledger;
use crate::model::{Coin, Command, Product};

mod config;
pub use config::{AdminCredentials, CredentialCheck, Locked, MachineConfig};

mod error;
pub use error::{
    ConfigError, MachineError, PrivilegeError, PurchaseError, SelectionError, StockError,
};

mod report;

mod state;
pub use state::MachineState;

/// The item chosen on the keypad, with its price resolved at selection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub product: Product,
    pub code: &'static str,
    pub price: Amount,
}

impl Selection {
    fn new(product: Product) -> Self {
        Self {
            product,
            code: product.code(),
            price: product.price(),
        }
    }
}

pub struct Machine {
    config: MachineConfig,
    credentials: Box<dyn CredentialCheck + Send + Sync>,
    state: MachineState,
    selection: Option<Selection>,
    /// Coins owned by the machine, including coins inserted for the current sale
    coin_stock: Ledger<Coin>,
    /// Coins inserted by the current customer
    inserted_coins: Ledger<Coin>,
    /// Change being paid out, before it reaches the bucket
    refund_coins: Ledger<Coin>,
    coin_bucket: Ledger<Coin>,
    product_stock: Ledger<Product>,
    product_bucket: Ledger<Product>,
}

/// Public API
impl Machine {
    /// Build a machine stocked to the configured levels.
    ///
    /// Starts idle, or in [`MachineState::ProductEmpty`] when there is no product.
    pub fn new(
        config: MachineConfig,
        credentials: impl CredentialCheck + Send + Sync + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let product_stock = Ledger::filled(config.product_level);
        let state = MachineState::base(product_stock.is_empty());
        info!(
            capacity = config.max_capacity,
            products = config.product_level,
            coins = config.coin_level,
            state = %state,
            "machine initialised"
        );

        Ok(Self {
            config,
            credentials: Box::new(credentials),
            state,
            selection: None,
            coin_stock: Ledger::filled(config.coin_level),
            inserted_coins: Ledger::new(),
            refund_coins: Ledger::new(),
            coin_bucket: Ledger::new(),
            product_stock,
            product_bucket: Ledger::new(),
        })
    }

    /// Run the machine over a stream of commands. Failed commands are logged and skipped.
    pub async fn run(&mut self, mut stream: impl Stream<Item = Command> + Unpin) {
        while let Some(command) = stream.next().await {
            // a rejected command must not stop the machine
            let _ = self.apply(command);
        }
    }

    /// Apply a single command on top of the current machine state.
    pub fn apply(&mut self, command: Command) -> Result<(), MachineError> {
        let name = command.name();
        let result = self.dispatch(command);
        self.log_result(name, &result);
        result
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn coin_stock(&self) -> &Ledger<Coin> {
        &self.coin_stock
    }

    pub fn inserted_coins(&self) -> &Ledger<Coin> {
        &self.inserted_coins
    }

    pub fn refund_coins(&self) -> &Ledger<Coin> {
        &self.refund_coins
    }

    pub fn coin_bucket(&self) -> &Ledger<Coin> {
        &self.coin_bucket
    }

    pub fn product_stock(&self) -> &Ledger<Product> {
        &self.product_stock
    }

    pub fn product_bucket(&self) -> &Ledger<Product> {
        &self.product_bucket
    }

    pub fn coin_stock_total(&self) -> Amount {
        self.coin_stock.total_value()
    }

    /// True when every product is sold out.
    pub fn is_empty(&self) -> bool {
        self.product_stock.is_empty()
    }

    /// Enter a product code on the keypad.
    pub fn select_item(&mut self, code: &str) -> Result<Product, MachineError> {
        match self.state {
            MachineState::IdleNoSelection => {
                let product = self.enter_code(code)?;
                self.transition(MachineState::ItemSelected);
                Ok(product)
            }
            MachineState::ItemSelected | MachineState::CoinInserted | MachineState::Admin => {
                Ok(self.enter_code(code)?)
            }
            MachineState::ItemPurchased | MachineState::ProductEmpty => {
                Err(SelectionError::Unavailable(self.state).into())
            }
        }
    }

    pub fn current_item(&self) -> Result<Product, SelectionError> {
        self.selection
            .map(|s| s.product)
            .ok_or(SelectionError::NoItemSelected)
    }

    pub fn selected_price(&self) -> Result<Amount, SelectionError> {
        self.selection
            .map(|s| s.price)
            .ok_or(SelectionError::NoItemSelected)
    }

    /// Feed `count` coins of one kind into the slot.
    ///
    /// In admin mode the coins go straight into the machine's float.
    pub fn insert_coin(&mut self, coin: Coin, count: u32) -> Result<(), MachineError> {
        if count < 1 {
            return Err(StockError::InvalidCoinCount(count).into());
        }
        self.check_room(coin, count)?;

        match self.state {
            MachineState::IdleNoSelection => self.notice("select an item before inserting coins"),
            MachineState::ItemSelected => {
                self.accept_coins(coin, count);
                self.transition(MachineState::CoinInserted);
            }
            MachineState::CoinInserted => self.accept_coins(coin, count),
            MachineState::ItemPurchased => self.notice("collect your items before inserting coins"),
            MachineState::ProductEmpty => self.notice("machine is out of stock"),
            MachineState::Admin => {
                self.coin_stock.add(coin, count);
                info!(coin = %coin, count, "admin added coins");
            }
        }
        Ok(())
    }

    /// Money held for the current customer, as seen from the current state.
    pub fn amount_deposited(&self) -> Amount {
        match self.state {
            MachineState::CoinInserted => self.inserted_coins.total_value(),
            MachineState::ItemPurchased => self.refund_coins.total_value(),
            MachineState::Admin => self.coin_stock.total_value(),
            MachineState::IdleNoSelection
            | MachineState::ItemSelected
            | MachineState::ProductEmpty => Amount::ZERO,
        }
    }

    /// Return the customer's money to the coin bucket.
    pub fn request_refund(&mut self) -> Result<(), MachineError> {
        match self.state {
            MachineState::IdleNoSelection | MachineState::ItemSelected => {
                self.notice("no money to refund")
            }
            MachineState::CoinInserted => {
                self.refund_deposit()?;
                self.transition(MachineState::IdleNoSelection);
            }
            MachineState::ItemPurchased => {
                if self.refund_coins.is_empty() {
                    self.notice("no change to refund");
                } else {
                    self.flush_refund();
                }
            }
            MachineState::ProductEmpty => self.notice("machine is out of stock"),
            MachineState::Admin => self.notice("log out to request a refund"),
        }
        Ok(())
    }

    /// Buy the selected item. Change is held in the refund ledger until the
    /// customer asks for a refund or collects.
    ///
    /// In admin mode this takes one unit of the selected item without payment.
    pub fn purchase_item(&mut self) -> Result<(), MachineError> {
        match self.state {
            MachineState::IdleNoSelection => self.notice("select an item to purchase"),
            MachineState::ItemSelected => self.notice("insert money to purchase the selected item"),
            MachineState::CoinInserted => {
                self.complete_purchase()?;
                self.transition(MachineState::ItemPurchased);
            }
            MachineState::ItemPurchased => self.notice("collect your items before purchasing"),
            MachineState::ProductEmpty => self.notice("machine is out of stock"),
            MachineState::Admin => self.take_item()?,
        }
        Ok(())
    }

    /// Take every product out of the bucket.
    ///
    /// Collecting a purchase ends the transaction.
    pub fn collect_products(&mut self) -> Vec<Product> {
        match self.state {
            MachineState::ItemSelected | MachineState::CoinInserted => {
                self.notice("no purchase has been made yet");
                Vec::new()
            }
            MachineState::ItemPurchased => {
                self.flush_refund();
                let products = self.drain_products();
                self.settle();
                products
            }
            MachineState::IdleNoSelection | MachineState::ProductEmpty | MachineState::Admin => {
                self.drain_products()
            }
        }
    }

    /// Take every coin out of the bucket.
    ///
    /// After a purchase the change is released into the bucket first.
    pub fn collect_coins(&mut self) -> Vec<Coin> {
        if self.state == MachineState::ItemPurchased {
            self.flush_refund();
        }
        let value = self.coin_bucket.total_value();
        let coins = self.coin_bucket.drain();
        if coins.is_empty() {
            self.notice("no coins to collect");
        } else {
            info!(count = coins.len(), value = %value, "coins collected");
        }
        coins
    }

    /// Enter admin mode. Any selection is cleared and any deposit refunded first.
    pub fn login(&mut self, username: &str, password: &str) -> Result<(), MachineError> {
        if self.state.is_admin() {
            self.notice("already logged in");
            return Ok(());
        }
        if !self.credentials.verify(username, password) {
            return Err(PrivilegeError::InvalidCredentials.into());
        }

        match self.state {
            MachineState::CoinInserted => self.refund_deposit()?,
            MachineState::ItemPurchased => self.flush_refund(),
            MachineState::IdleNoSelection
            | MachineState::ItemSelected
            | MachineState::ProductEmpty
            | MachineState::Admin => {}
        }
        self.selection = None;
        self.transition(MachineState::Admin);
        debug!("\n{}\n{}", self.product_report(), self.coin_report());
        Ok(())
    }

    /// Leave admin mode for idle, or for product-empty if nothing is stocked.
    pub fn logout(&mut self) -> Result<(), MachineError> {
        self.require_admin("logout")?;
        self.settle();
        Ok(())
    }

    /// Admin: add `count` of every coin type to the coin stock.
    pub fn deposit_coins(&mut self, count: u32) -> Result<(), MachineError> {
        self.require_admin("deposit coins")?;
        if count < 1 {
            return Err(StockError::InvalidCoinCount(count).into());
        }
        for coin in Coin::ALL {
            self.check_room(coin, count)?;
        }
        for coin in Coin::ALL {
            self.insert_coin(coin, count)?;
        }
        Ok(())
    }

    /// Admin: empty the coin stock and hand out every coin.
    pub fn withdraw_coins(&mut self) -> Result<Vec<Coin>, MachineError> {
        self.require_admin("withdraw coins")?;
        let total = self.coin_stock.total_value();
        change::breakdown(total, &mut self.coin_stock, &mut self.refund_coins)
            .map_err(StockError::from)?;
        let coins = self.refund_coins.drain();
        info!(count = coins.len(), value = %total, "admin withdrew coins");
        Ok(coins)
    }

    /// Admin: restock one product to capacity.
    pub fn refill_product(&mut self, code: &str) -> Result<(), MachineError> {
        self.require_admin("refill product")?;
        let product =
            Product::from_code(code).ok_or_else(|| SelectionError::InvalidCode(code.to_string()))?;

        let capacity = self.config.max_capacity;
        if self.product_stock.get(product) >= capacity {
            self.notice("product is already at capacity");
        } else {
            self.product_stock.set(product, capacity);
            info!(product = %product, level = capacity, "product refilled");
        }
        Ok(())
    }

    /// Admin: restock every product to capacity.
    pub fn refill_all_products(&mut self) -> Result<(), MachineError> {
        self.require_admin("refill products")?;
        self.product_stock.set_all(self.config.max_capacity);
        info!(level = self.config.max_capacity, "all products refilled");
        Ok(())
    }

    /// Units of the product with this code left in stock.
    pub fn stock_level(&self, code: &str) -> Result<u32, SelectionError> {
        let product =
            Product::from_code(code).ok_or_else(|| SelectionError::InvalidCode(code.to_string()))?;
        Ok(self.product_stock.get(product))
    }

    pub fn admin_coin_report(&self) -> Result<String, MachineError> {
        self.require_admin("coin report")?;
        Ok(self.coin_report())
    }

    pub fn admin_product_report(&self) -> Result<String, MachineError> {
        self.require_admin("product report")?;
        Ok(self.product_report())
    }
}

/// Private API
impl Machine {
    fn dispatch(&mut self, command: Command) -> Result<(), MachineError> {
        match command {
            Command::Select { code } => {
                self.select_item(&code)?;
            }
            Command::InsertCoin { coin, count } => self.insert_coin(coin, count)?,
            Command::Purchase => self.purchase_item()?,
            Command::Refund => self.request_refund()?,
            Command::CollectProducts => {
                let products = self.collect_products();
                if !products.is_empty() {
                    info!(products = ?products, "products collected");
                }
            }
            Command::CollectCoins => {
                self.collect_coins();
            }
            Command::Login { username, password } => self.login(&username, &password)?,
            Command::Logout => self.logout()?,
            Command::DepositCoins { count } => self.deposit_coins(count)?,
            Command::WithdrawCoins => {
                self.withdraw_coins()?;
            }
            Command::RefillProduct { code } => self.refill_product(&code)?,
            Command::RefillAllProducts => self.refill_all_products()?,
            Command::StockLevel { code } => {
                let level = self.stock_level(&code)?;
                info!(code = %code, level, "stock level");
            }
            Command::Report => {
                let products = self.admin_product_report()?;
                let coins = self.admin_coin_report()?;
                info!("\n{products}\n{coins}");
            }
        }
        Ok(())
    }

    /// Small helper to log `apply` results
    fn log_result(&self, command: &str, result: &Result<(), MachineError>) {
        match result {
            Ok(()) => info!(state = %self.state, "{command} applied"),
            Err(e) => info!(state = %self.state, reason = %e, "{command} skipped"),
        }
    }

    /// A request the current state ignores.
    fn notice(&self, message: &str) {
        info!(state = %self.state, "{message}");
    }

    fn transition(&mut self, to: MachineState) {
        if matches!(to, MachineState::IdleNoSelection | MachineState::ProductEmpty) {
            self.selection = None;
        }
        if self.state != to {
            info!(from = %self.state, to = %to, "state changed");
            self.state = to;
        }
    }

    /// Return to idle, or to product-empty when nothing is left to sell.
    fn settle(&mut self) {
        self.transition(MachineState::base(self.is_empty()));
    }

    /// Every physical coin of one kind must stay countable.
    fn check_room(&self, coin: Coin, count: u32) -> Result<(), StockError> {
        let held = u64::from(self.coin_stock.get(coin))
            + u64::from(self.refund_coins.get(coin))
            + u64::from(self.coin_bucket.get(coin));
        if held + u64::from(count) > u64::from(u32::MAX) {
            return Err(StockError::Overflow(coin, count));
        }
        Ok(())
    }

    fn require_admin(&self, action: &'static str) -> Result<(), PrivilegeError> {
        if self.state.is_admin() {
            Ok(())
        } else {
            Err(PrivilegeError::AdminRequired(action))
        }
    }

    /// Keypad entry: resolve the code and move the cursor to it.
    fn enter_code(&mut self, code: &str) -> Result<Product, SelectionError> {
        let product =
            Product::from_code(code).ok_or_else(|| SelectionError::InvalidCode(code.to_string()))?;
        let selection = Selection::new(product);
        info!(product = %product, price = %selection.price, "item selected");
        self.selection = Some(selection);
        Ok(product)
    }

    /// Coin slot: credit the customer's deposit and the machine's float together.
    fn accept_coins(&mut self, coin: Coin, count: u32) {
        self.coin_stock.add(coin, count);
        self.inserted_coins.add(coin, count);
        info!(
            coin = %coin,
            count,
            deposited = %self.inserted_coins.total_value(),
            "coins inserted"
        );
    }

    /// Pay the whole deposit back into the coin bucket.
    fn refund_deposit(&mut self) -> Result<(), StockError> {
        let amount = self.inserted_coins.total_value();
        change::breakdown(amount, &mut self.coin_stock, &mut self.refund_coins)?;
        self.inserted_coins.set_all(0);
        info!(amount = %amount, "deposit refunded");
        self.flush_refund();
        Ok(())
    }

    /// Move any change still held in the refund ledger into the coin bucket.
    fn flush_refund(&mut self) {
        if self.refund_coins.is_empty() {
            return;
        }
        let value = self.refund_coins.total_value();
        self.coin_bucket.absorb(&mut self.refund_coins);
        info!(value = %value, "change placed in bucket");
    }

    /// Sell the selected item against the deposit.
    ///
    /// Funds, stock and exact change are all checked before any ledger moves.
    fn complete_purchase(&mut self) -> Result<(), MachineError> {
        let Selection { product, price, .. } =
            self.selection.ok_or(SelectionError::NoItemSelected)?;
        let deposited = self.inserted_coins.total_value();

        if deposited < price {
            return Err(PurchaseError::InsufficientFunds(product, price, deposited).into());
        }
        if self.product_stock.get(product) == 0 {
            return Err(PurchaseError::OutOfStock(product).into());
        }

        let change = deposited - price;
        change::breakdown(change, &mut self.coin_stock, &mut self.refund_coins)
            .map_err(StockError::from)?;

        self.inserted_coins.set_all(0);
        self.dispense(product);
        info!(product = %product, price = %price, change = %change, "item purchased");
        Ok(())
    }

    /// Admin withdrawal of one unit of the selected item, free of charge.
    fn take_item(&mut self) -> Result<(), MachineError> {
        let product = self.current_item()?;
        if self.product_stock.get(product) == 0 {
            return Err(PurchaseError::OutOfStock(product).into());
        }
        self.dispense(product);
        info!(product = %product, "admin took item");
        Ok(())
    }

    /// Drop one unit from stock into the bucket and clear the cursor.
    fn dispense(&mut self, product: Product) {
        self.product_stock.decrement(product);
        self.product_bucket.increment(product);
        self.selection = None;
    }

    fn drain_products(&mut self) -> Vec<Product> {
        let products = self.product_bucket.drain();
        if products.is_empty() {
            self.notice("no items to collect");
        }
        products
    }

    fn coin_report(&self) -> String {
        report::coin_report(&self.coin_stock)
    }

    fn product_report(&self) -> String {
        report::product_report(&self.product_stock)
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("selection", &self.selection)
            .field("coin_stock", &self.coin_stock)
            .field("inserted_coins", &self.inserted_coins)
            .field("refund_coins", &self.refund_coins)
            .field("coin_bucket", &self.coin_bucket)
            .field("product_stock", &self.product_stock)
            .field("product_bucket", &self.product_bucket)
            .finish_non_exhaustive()
    }
}
