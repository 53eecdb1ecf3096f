use crate::messages::Message;
use crate::{styles, App, MUTED};
use hello_dapp_core::display::{short_address, wallet_button_label};
use iced::widget::{button, column, container, row, text, text_input, Space};
use iced::{Alignment, Element, Fill, Font};

impl App {
    pub(crate) fn view_dapp(&self) -> Element<'_, Message> {
        let content = column![
            self.view_header(),
            styles::separator(),
            self.view_message_card(),
            self.view_update_form(),
            self.view_status(),
        ]
        .spacing(16)
        .padding(24)
        .max_width(720);

        container(content).center_x(Fill).into()
    }

    fn view_header(&self) -> Element<'_, Message> {
        let network = if self.demo {
            "demo".to_string()
        } else {
            self.config.network.network.to_string()
        };
        let badge = container(text(network).size(12))
            .padding([4, 10])
            .style(styles::pill);

        let mut connect = button(
            text(wallet_button_label(self.state.wallet_address.as_ref())).size(14),
        )
        .padding([8, 16])
        .style(styles::btn_secondary);
        if !self.busy && !self.loading {
            connect = connect.on_press(Message::ConnectWallet);
        }

        let mut right = row![badge, connect]
            .spacing(8)
            .align_y(Alignment::Center);
        if self.state.wallet_address.is_some() {
            right = right.push(
                button(text("Copy").size(11))
                    .style(styles::btn_secondary)
                    .on_press(Message::CopyAddress),
            );
        }

        row![
            text("Hello World dApp").size(22).font(styles::BOLD),
            Space::new().width(Fill),
            right,
        ]
        .align_y(Alignment::Center)
        .into()
    }

    fn view_message_card(&self) -> Element<'_, Message> {
        let message = if self.loading {
            "Loading..."
        } else {
            self.state.current_message.as_str()
        };
        let contract = short_address(&self.config.contract_address);

        let body = column![
            text("Current Message:").size(12).color(MUTED),
            text(message).size(20),
            text(format!("Contract {contract}"))
                .size(11)
                .color(MUTED)
                .font(Font::MONOSPACE),
        ]
        .spacing(8);

        container(body)
            .padding(20)
            .width(Fill)
            .style(styles::card)
            .into()
    }

    fn view_update_form(&self) -> Element<'_, Message> {
        let mut input = text_input("Update the message in your smart contract.", &self.draft);
        let mut update = button(text("Update").size(14))
            .padding([10, 24])
            .style(styles::btn_primary);
        if self.session.is_some() && !self.busy {
            input = input
                .on_input(Message::DraftChanged)
                .on_submit(Message::SubmitUpdate);
            update = update.on_press(Message::SubmitUpdate);
        }

        column![
            text("New Message:").size(12).color(MUTED),
            row![input, update].spacing(8).align_y(Alignment::Center),
        ]
        .spacing(8)
        .into()
    }

    fn view_status(&self) -> Element<'_, Message> {
        let status = &self.state.status;
        let mut col = column![text(status.to_string())
            .size(14)
            .color(styles::status_color(status.kind()))]
        .spacing(6);

        if let Some(link) = status.link() {
            col = col.push(
                button(text("View transaction on Etherscan").size(13))
                    .padding(0)
                    .style(styles::btn_link)
                    .on_press(Message::OpenExplorer(link.to_string())),
            );
        }
        if let Some(notice) = &self.notice {
            col = col.push(text(notice.as_str()).size(12).color(styles::SUCCESS));
        }
        if let Some(err) = &self.error_message {
            col = col.push(text(err.as_str()).size(12).color(styles::DANGER));
        }

        col.into()
    }
}
