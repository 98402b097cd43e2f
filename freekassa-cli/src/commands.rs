//! Subcommands and their mapping onto gateway calls.

use clap::{Args, Subcommand};
use freekassa_sdk::client::{ClientError, GatewayClient};
use freekassa_sdk::objects::order::DEFAULT_CURRENCY;
use freekassa_sdk::objects::{EmailAddress, OrderListQuery, OrderRequest, RequestParams};
use rust_decimal::Decimal;
use std::net::IpAddr;
use url::Url;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the shop's balance
    Balance,
    /// Create a payment order and print the payment link
    CreateOrder(CreateOrderArgs),
    /// List the shop's orders
    Orders(OrdersArgs),
}

#[derive(Args, Debug)]
pub struct CreateOrderArgs {
    /// Payment system id (e.g. 36 for card payments)
    #[arg(long)]
    payment_system_id: i64,

    /// Buyer email address
    #[arg(long)]
    email: EmailAddress,

    /// Buyer IP address
    #[arg(long)]
    ip: IpAddr,

    /// Amount to charge
    #[arg(long)]
    amount: Decimal,

    #[arg(long, default_value = DEFAULT_CURRENCY)]
    currency: String,

    /// Merchant-side order id
    #[arg(long)]
    payment_id: Option<String>,

    /// Buyer phone number
    #[arg(long)]
    phone: Option<String>,

    #[arg(long)]
    success_url: Option<Url>,

    #[arg(long)]
    failure_url: Option<Url>,

    #[arg(long)]
    notification_url: Option<Url>,
}

impl From<CreateOrderArgs> for OrderRequest {
    fn from(args: CreateOrderArgs) -> Self {
        let mut order = OrderRequest::new(args.payment_system_id, args.email, args.ip, args.amount)
            .with_currency(args.currency);
        order.payment_id = args.payment_id;
        order.phone = args.phone;
        order.success_url = args.success_url;
        order.failure_url = args.failure_url;
        order.notification_url = args.notification_url;
        order
    }
}

#[derive(Args, Debug)]
pub struct OrdersArgs {
    #[arg(long)]
    order_id: Option<i64>,

    #[arg(long)]
    payment_id: Option<String>,

    #[arg(long)]
    order_status: Option<i32>,

    #[arg(long)]
    page: Option<u32>,
}

impl From<OrdersArgs> for OrderListQuery {
    fn from(args: OrdersArgs) -> Self {
        Self {
            order_id: args.order_id,
            payment_id: args.payment_id,
            order_status: args.order_status,
            page: args.page,
        }
    }
}

/// Execute `command` and return the gateway's response payload.
pub async fn run(client: &GatewayClient, command: Command) -> Result<RequestParams, ClientError> {
    match command {
        Command::Balance => client.get_balance().await,
        Command::CreateOrder(args) => {
            let order = OrderRequest::from(args);
            tracing::info!(
                amount = %order.amount,
                currency = %order.currency_code,
                "Creating order"
            );
            client.create_order(&order).await
        }
        Command::Orders(args) => client.list_orders(&args.into()).await,
    }
}
